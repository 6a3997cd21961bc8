use glossary_core::reader::{self, CellValue, Hyperlink, ValidationKind, WorksheetSource};
use glossary_core::{ExtractConfig, ExtractError, Extractor, ResourceMap, TagDropdownMap};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// One worksheet of a mock package: name, XML inside `<worksheet>`, and
/// external hyperlink relationships as (Id, Target)
struct MockSheet<'a> {
    name: &'a str,
    body: &'a str,
    links: &'a [(&'a str, &'a str)],
}

// Helper to create a minimal valid XLSX file for testing
fn create_mock_xlsx(path: &Path, sheets: &[MockSheet], shared_strings: &[&str]) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    // 1. [Content_Types].xml
    zip.start_file("[Content_Types].xml", options)?;
    let mut content_types = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>
"#,
    );
    for (i, _) in sheets.iter().enumerate() {
        content_types.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            i + 1
        ));
    }
    content_types.push_str("</Types>");
    zip.write_all(content_types.as_bytes())?;

    // 2. _rels/.rels
    zip.start_file("_rels/.rels", options)?;
    zip.write_all(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#.as_bytes())?;

    // 3. xl/workbook.xml
    zip.start_file("xl/workbook.xml", options)?;
    let mut workbook_xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets>
"#,
    );
    for (i, sheet) in sheets.iter().enumerate() {
        workbook_xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            sheet.name,
            i + 1,
            i + 1
        ));
    }
    workbook_xml.push_str("</sheets></workbook>");
    zip.write_all(workbook_xml.as_bytes())?;

    // 4. xl/_rels/workbook.xml.rels
    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    let mut rels_xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
"#,
    );
    for (i, _) in sheets.iter().enumerate() {
        rels_xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            i + 1, i + 1
        ));
    }
    rels_xml.push_str("</Relationships>");
    zip.write_all(rels_xml.as_bytes())?;

    // 5. xl/sharedStrings.xml
    zip.start_file("xl/sharedStrings.xml", options)?;
    let mut sst = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        shared_strings.len()
    );
    for s in shared_strings {
        sst.push_str(&format!(r#"<si><t xml:space="preserve">{}</t></si>"#, s));
    }
    sst.push_str("</sst>");
    zip.write_all(sst.as_bytes())?;

    // 6. sheets and their hyperlink relationships
    for (i, sheet) in sheets.iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
        zip.write_all(format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">{}</worksheet>"#,
            sheet.body
        ).as_bytes())?;

        if !sheet.links.is_empty() {
            zip.start_file(format!("xl/worksheets/_rels/sheet{}.xml.rels", i + 1), options)?;
            let mut sheet_rels = String::from(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            );
            for (id, target) in sheet.links {
                sheet_rels.push_str(&format!(
                    r#"<Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="{}" TargetMode="External"/>"#,
                    id, target
                ));
            }
            sheet_rels.push_str("</Relationships>");
            zip.write_all(sheet_rels.as_bytes())?;
        }
    }

    zip.finish()?;
    Ok(())
}

const SHARED_STRINGS: &[&str] = &["Tag", "Title", "Link", "Topic", "Guide", "Audience"];

const GLOSSARY_BODY: &str = r#"<sheetData>
<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="s"><v>2</v></c></row>
<row r="3"><c r="A3" t="s"><v>3</v></c><c r="B3" t="inlineStr"><is><t>Onboarding Guide</t></is></c><c r="C3" t="s"><v>4</v></c></row>
<row r="4"><c r="A4" t="s"><v>5</v></c><c r="B4" t="str"><f>"Budget"&amp;" Sheet"</f><v>Budget Sheet</v></c><c r="C4" t="inlineStr"><is><t>https://docs.google.com/spreadsheets/d/XYZ/edit#gid=0</t></is></c></row>
<row r="5"><c r="A5" t="s"><v>3</v></c><c r="B5" t="inlineStr"><is><t>External Article</t></is></c><c r="C5" t="inlineStr"><is><t>https://example.com/not-a-doc</t></is></c></row>
<row r="6"><c r="A6"/><c r="B6"><v>2024</v></c><c r="C6" t="inlineStr"><is><t>Slides</t></is></c></row>
<row r="7"><c r="A7" t="s"><v>3</v></c><c r="B7" t="inlineStr"><is><t>Late Entry</t></is></c><c r="C7" t="inlineStr"><is><t>https://drive.google.com/file/d/LATE/view</t></is></c></row>
</sheetData>
<dataValidations count="2">
<dataValidation type="list" allowBlank="1" showInputMessage="1" sqref="A3:A5 A7"><formula1>"Policy,Training,Template"</formula1></dataValidation>
<dataValidation type="whole" sqref="D3:D10"><formula1>0</formula1><formula2>10</formula2></dataValidation>
</dataValidations>
<hyperlinks>
<hyperlink ref="C3" r:id="rId1"/>
<hyperlink ref="C6" r:id="rId2"/>
</hyperlinks>"#;

const GLOSSARY_LINKS: &[(&str, &str)] = &[
    ("rId1", "https://docs.google.com/document/d/ABC123/edit"),
    ("rId2", "https://docs.google.com/presentation/d/PRES9/edit?usp=sharing"),
];

fn write_glossary(dir: &Path) -> anyhow::Result<std::path::PathBuf> {
    let path = dir.join("glossary.xlsx");
    create_mock_xlsx(
        &path,
        &[
            MockSheet {
                name: "Notes",
                body: "<sheetData/>",
                links: &[],
            },
            MockSheet {
                name: "Glossary",
                body: GLOSSARY_BODY,
                links: GLOSSARY_LINKS,
            },
        ],
        SHARED_STRINGS,
    )?;
    Ok(path)
}

fn glossary_config(dir: &Path, input: std::path::PathBuf) -> ExtractConfig {
    ExtractConfig {
        input,
        sheet: "Glossary".to_string(),
        start_row: 3,
        end_row: 6,
        tag_dropdowns_output: dir.join("tag_dropdowns.json"),
        resources_output: dir.join("resource_dict.json"),
        ..ExtractConfig::default()
    }
}

#[test]
fn test_read_worksheet() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_glossary(dir.path())?;

    let sheet = reader::read_worksheet(&path, "Glossary")?;

    assert_eq!(sheet.cell_value(1, 1), Some(&CellValue::text("Tag")));
    assert_eq!(sheet.cell_value(3, 3), Some(&CellValue::text("Guide")));
    assert_eq!(sheet.cell_value(4, 2), Some(&CellValue::text("Budget Sheet")));
    assert_eq!(sheet.cell_value(6, 2), Some(&CellValue::Number(2024.0)));
    assert_eq!(sheet.cell_value(6, 1), None);

    assert_eq!(
        sheet.hyperlink(3, 3),
        Some(&Hyperlink::external("https://docs.google.com/document/d/ABC123/edit"))
    );
    assert_eq!(sheet.hyperlink(4, 3), None);

    let validations = sheet.data_validations();
    assert_eq!(validations.len(), 2);
    assert_eq!(validations[0].kind, ValidationKind::List);
    assert_eq!(validations[0].formula1.as_deref(), Some("\"Policy,Training,Template\""));
    assert_eq!(validations[0].ranges.len(), 2);
    assert_eq!(validations[1].kind, ValidationKind::Whole);

    Ok(())
}

#[test]
fn test_run_writes_both_files() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = write_glossary(dir.path())?;
    let config = glossary_config(dir.path(), input);

    let summary = Extractor::with_config(config.clone()).run()?;
    assert_eq!(summary.tag_dropdown_count, 2);
    assert_eq!(summary.resource_count, 3);
    assert_eq!(summary.tag_dropdowns_path, config.tag_dropdowns_output);
    assert_eq!(summary.resources_path, config.resources_output);

    let tags: TagDropdownMap =
        serde_json::from_str(&fs::read_to_string(&config.tag_dropdowns_output)?)?;
    let options = vec!["Policy", "Training", "Template"];
    assert_eq!(tags.keys().collect::<Vec<_>>(), vec!["Topic", "Audience"]);
    assert_eq!(tags["Topic"], options);
    assert_eq!(tags["Audience"], options);

    let resources: ResourceMap =
        serde_json::from_str(&fs::read_to_string(&config.resources_output)?)?;
    assert_eq!(
        resources.keys().collect::<Vec<_>>(),
        vec!["Onboarding Guide", "Budget Sheet", "2024"]
    );
    assert_eq!(
        resources["Onboarding Guide"].link.as_deref(),
        Some("https://docs.google.com/document/d/ABC123/export?format=pdf")
    );
    assert_eq!(resources["Onboarding Guide"].tags, options);
    assert_eq!(
        resources["Budget Sheet"].link.as_deref(),
        Some("https://docs.google.com/spreadsheets/d/XYZ/export?format=xlsx")
    );
    assert_eq!(
        resources["2024"].link.as_deref(),
        Some("https://docs.google.com/presentation/d/PRES9/export/pdf")
    );
    assert!(resources["2024"].tags.is_empty());

    // Non-hosted link and a row past end_row never show up
    assert!(!resources.contains_key("External Article"));
    assert!(!resources.contains_key("Late Entry"));

    Ok(())
}

#[test]
fn test_wider_row_range_picks_up_late_entry() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = write_glossary(dir.path())?;
    let config = ExtractConfig {
        end_row: 115,
        ..glossary_config(dir.path(), input)
    };

    let extraction = Extractor::with_config(config).extract_file()?;
    assert_eq!(
        extraction.resources["Late Entry"].link.as_deref(),
        Some("https://drive.google.com/uc?export=download&id=LATE")
    );
    assert_eq!(extraction.resources["Late Entry"].tags.len(), 3);

    Ok(())
}

#[test]
fn test_missing_sheet() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = write_glossary(dir.path())?;
    let config = ExtractConfig {
        sheet: "Sheet1".to_string(),
        ..glossary_config(dir.path(), input)
    };

    let err = Extractor::with_config(config.clone()).run().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ExtractError>(),
        Some(ExtractError::SheetNotFound { sheet }) if sheet == "Sheet1"
    ));
    // Nothing is written when reading fails
    assert!(!config.tag_dropdowns_output.exists());
    assert!(!config.resources_output.exists());

    Ok(())
}

#[test]
fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = glossary_config(dir.path(), dir.path().join("absent.xlsx"));
    assert!(Extractor::with_config(config).extract_file().is_err());
}

#[test]
fn test_unsupported_format() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("glossary.csv");
    fs::write(&input, "Tag,Title,Link\n")?;

    let err = Extractor::with_config(glossary_config(dir.path(), input))
        .extract_file()
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ExtractError>(),
        Some(ExtractError::UnsupportedFormat { .. })
    ));

    Ok(())
}

#[test]
fn test_hyperlink_ranges_and_internal_links() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("links.xlsx");
    create_mock_xlsx(
        &path,
        &[MockSheet {
            name: "Sheet1",
            body: r#"<sheetData>
<row r="3"><c r="B3" t="inlineStr"><is><t>First</t></is></c><c r="C3" t="inlineStr"><is><t>a</t></is></c></row>
<row r="4"><c r="B4" t="inlineStr"><is><t>Second</t></is></c><c r="C4" t="inlineStr"><is><t>b</t></is></c></row>
<row r="5"><c r="B5" t="inlineStr"><is><t>Jump</t></is></c><c r="C5" t="inlineStr"><is><t>https://drive.google.com/file/d/HIDDEN/view</t></is></c></row>
</sheetData>
<hyperlinks>
<hyperlink ref="C3:C4" r:id="rId7"/>
<hyperlink ref="C5" location="'Notes'!A1" display="Notes"/>
</hyperlinks>"#,
            links: &[("rId7", "https://drive.google.com/file/d/SHARED/view")],
        }],
        &[],
    )?;

    let sheet = reader::read_worksheet(&path, "Sheet1")?;
    assert_eq!(sheet.hyperlink(3, 3), sheet.hyperlink(4, 3));
    assert_eq!(sheet.hyperlink(5, 3).and_then(|l| l.target.as_deref()), None);
    assert_eq!(
        sheet.hyperlink(5, 3).and_then(|l| l.location.as_deref()),
        Some("'Notes'!A1")
    );

    let extraction = Extractor::new().extract(&sheet)?;
    assert_eq!(extraction.resources.len(), 2);
    assert!(extraction.tag_dropdowns.is_empty());
    for title in ["First", "Second"] {
        assert_eq!(
            extraction.resources[title].link.as_deref(),
            Some("https://drive.google.com/uc?export=download&id=SHARED")
        );
    }

    Ok(())
}

#[test]
fn test_invalid_row_range_writes_nothing() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = write_glossary(dir.path())?;
    let config = ExtractConfig {
        start_row: 10,
        end_row: 4,
        ..glossary_config(dir.path(), input)
    };

    let err = Extractor::with_config(config.clone()).run().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ExtractError>(),
        Some(ExtractError::InvalidConfig(_))
    ));
    assert!(!config.tag_dropdowns_output.exists());
    assert!(!config.resources_output.exists());

    Ok(())
}

#[test]
fn test_whole_column_dropdown() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("column.xlsx");
    create_mock_xlsx(
        &path,
        &[MockSheet {
            name: "Sheet1",
            body: r#"<sheetData>
<row r="3"><c r="A3" t="inlineStr"><is><t>Topic</t></is></c><c r="B3" t="inlineStr"><is><t>Guide</t></is></c><c r="C3" t="inlineStr"><is><t>https://drive.google.com/file/d/G1/view</t></is></c></row>
</sheetData>
<dataValidations count="1">
<dataValidation type="list" allowBlank="1" sqref="A:A"><formula1>"Policy,Training"</formula1></dataValidation>
</dataValidations>"#,
            links: &[],
        }],
        &[],
    )?;

    let config = ExtractConfig {
        input: path,
        ..ExtractConfig::default()
    };
    let extraction = Extractor::with_config(config).extract_file()?;
    assert_eq!(extraction.tag_dropdowns["Topic"], vec!["Policy", "Training"]);
    assert_eq!(extraction.resources["Guide"].tags, vec!["Policy", "Training"]);

    Ok(())
}

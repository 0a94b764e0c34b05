use super::Sink;
use crate::domain::model::{value_to_text, OutputFormat, RecordSet};
use crate::utils::error::{EtlError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

const ROOT_TAG: &str = "employees";
const RECORD_TAG: &str = "employee";

/// `<employees>` with one `<employee>` per row; field names become tags with
/// spaces replaced by underscores.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlSink;

pub fn element_name(field: &str) -> String {
    field.replace(' ', "_")
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| EtlError::XmlError {
            message: e.to_string(),
        })
}

impl Sink for XmlSink {
    fn format(&self) -> OutputFormat {
        OutputFormat::Xml
    }

    fn encode(&self, batch: &RecordSet) -> Result<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        emit(&mut writer, Event::Start(BytesStart::new(ROOT_TAG)))?;

        for row in batch.rows() {
            emit(&mut writer, Event::Start(BytesStart::new(RECORD_TAG)))?;

            // 非物件列只留下空的 <employee>，筆數與其他格式一致
            if let Some(object) = row.as_object() {
                for (field, value) in object {
                    let tag = element_name(field);
                    emit(&mut writer, Event::Start(BytesStart::new(tag.as_str())))?;
                    // 空字串也寫出文字事件，讓結束標籤留在同一行
                    let text = value_to_text(value).unwrap_or_default();
                    emit(&mut writer, Event::Text(BytesText::new(&text)))?;
                    emit(&mut writer, Event::End(BytesEnd::new(tag.as_str())))?;
                }
            }

            emit(&mut writer, Event::End(BytesEnd::new(RECORD_TAG)))?;
        }

        emit(&mut writer, Event::End(BytesEnd::new(ROOT_TAG)))?;
        Ok(writer.into_inner())
    }
}

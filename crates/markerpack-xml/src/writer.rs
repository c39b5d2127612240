//! XML output for element trees.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::{Error, Result, XmlDocument, XmlNode};

fn xml_err(e: impl std::fmt::Display) -> Error {
    Error::Xml(e.to_string())
}

impl XmlNode {
    /// Write this element and its children.
    pub fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut elem = BytesStart::new(self.name.as_str());
        for attr in &self.attributes {
            elem.push_attribute((attr.name.as_str(), attr.value.as_str()));
        }

        if self.children.is_empty() && self.text.is_empty() {
            writer.write_event(Event::Empty(elem)).map_err(xml_err)?;
            return Ok(());
        }

        writer.write_event(Event::Start(elem)).map_err(xml_err)?;

        if !self.text.is_empty() {
            writer
                .write_event(Event::Text(BytesText::new(&self.text)))
                .map_err(xml_err)?;
        }

        for child in &self.children {
            child.write_xml(writer)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(xml_err)?;

        Ok(())
    }
}

impl XmlDocument {
    /// Write the document with an XML declaration and two-space indentation.
    pub fn write_xml<W: Write>(&self, writer: W) -> Result<()> {
        let mut xml_writer = Writer::new_with_indent(writer, b' ', 2);

        xml_writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(xml_err)?;

        self.root().write_xml(&mut xml_writer)
    }

    /// Convert to an XML string.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut output = Vec::new();
        self.write_xml(&mut output)?;
        String::from_utf8(output).map_err(xml_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_written_document_parses_back() {
        let root = XmlNode::new("overlaydata")
            .child(
                XmlNode::new("markercategory")
                    .attr("name", "a")
                    .attr("displayname", "Fish & \"Chips\" <3"),
            )
            .child(XmlNode::new("pois").child(XmlNode::new("poi").attr("type", "a")));

        let doc = XmlDocument::new(root);
        let xml = doc.to_xml_string().unwrap();
        assert!(xml.starts_with("<?xml"));

        let reparsed = XmlDocument::parse(&xml).unwrap();
        assert_eq!(reparsed.root(), doc.root());
    }

    #[test]
    fn test_text_content_is_written() {
        let mut node = XmlNode::new("note");
        node.text = "a < b".to_string();

        let xml = XmlDocument::new(node).to_xml_string().unwrap();
        let reparsed = XmlDocument::parse(&xml).unwrap();
        assert_eq!(reparsed.root().text, "a < b");
    }
}

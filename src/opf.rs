//! Package document handling
//!
//! Reads an OPF file into a [PackageDocument], converts its human-readable fields
//! and writes it back. The fields that are converted:
//!
//! - the text of the first `title` and the first `description` of the metadata
//! - the text of every `creator`; the `role` and other attributes are kept
//! - the `title` attribute of manifest items whose `properties` is exactly `title`
//!
//! Identifiers, hrefs, media types, properties, roles and idrefs are carried through
//! unchanged. The document is re-serialized with a two space indent for nested
//! elements, attributes stay on the line of their element, and the output starts
//! with an XML declaration. Comments and processing instructions are not kept.
//!
//! ## Notes
//! - Element order is only kept within each group. Inside `metadata` the title,
//!   the description and the creators are written first, followed by every other
//!   child in document order. Inside `manifest` and `spine` the items come before
//!   any other child, and the package sections come before other package children.
//! - Text made only of whitespace is dropped; any other text is kept as written,
//!   surrounding whitespace included.

use std::{fs, io::Cursor, path::Path};

use log::{info, warn};
use quick_xml::{
    Reader, Writer,
    escape::unescape,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use crate::{
    convert::TextConverter,
    error::EpubError,
    types::{
        Attribute, Element, Manifest, ManifestItem, Metadata, MetadataField, PackageDocument,
        Spine, SpineItem, find_attribute, local_name,
    },
    utils::DecodeBytes,
};

type XmlWriter = Writer<Cursor<Vec<u8>>>;

impl PackageDocument {
    /// Parses a package document from its XML text
    ///
    /// ## Return
    /// - `Ok(PackageDocument)`: the parsed document
    /// - `Err(EpubError)`: `MetadataParseError` when the XML is malformed or the root
    ///   element is not `package`; `MissingRequiredAttribute` when a manifest item or
    ///   itemref lacks an attribute the model needs
    pub fn parse(content: &str) -> Result<Self, EpubError> {
        let root = parse_tree(content)?;

        if local_name(&root.name) != "package" {
            return Err(EpubError::MetadataParseError {
                reason: format!(
                    "The root element is \"{}\", expected \"package\".",
                    root.name
                ),
            });
        }

        let mut package = PackageDocument {
            name: root.name,
            attributes: root.attributes,
            metadata: Metadata {
                name: "metadata".to_string(),
                ..Default::default()
            },
            manifest: Manifest {
                name: "manifest".to_string(),
                ..Default::default()
            },
            spine: Spine {
                name: "spine".to_string(),
                ..Default::default()
            },
            others: vec![],
        };

        let (mut has_metadata, mut has_manifest, mut has_spine) = (false, false, false);
        for child in root.children {
            let tag = local_name(&child.name).to_string();
            match tag.as_str() {
                "metadata" if !has_metadata => {
                    has_metadata = true;
                    package.metadata = parse_metadata(child);
                }
                "manifest" if !has_manifest => {
                    has_manifest = true;
                    package.manifest = parse_manifest(child)?;
                }
                "spine" if !has_spine => {
                    has_spine = true;
                    package.spine = parse_spine(child)?;
                }
                _ => package.others.push(child),
            }
        }

        Ok(package)
    }

    /// Converts the title, description, creators and flagged manifest titles
    ///
    /// Either every field is converted or, when the converter fails on any of them,
    /// the document is left exactly as it was.
    pub fn convert<C: TextConverter + ?Sized>(&mut self, converter: &C) -> Result<(), EpubError> {
        let mut converted = self.clone();

        if let Some(title) = converted.metadata.title.as_mut() {
            title.text = converter.convert(&title.text)?;
        }

        if let Some(description) = converted.metadata.description.as_mut() {
            description.text = converter.convert(&description.text)?;
        }

        for creator in converted.metadata.creators.iter_mut() {
            creator.text = converter.convert(&creator.text)?;
        }

        for item in converted.manifest.items.iter_mut() {
            if !item.has_title_flag() {
                continue;
            }

            if let Some(title) = item.title.as_mut() {
                *title = converter.convert(title)?;
            }
        }

        *self = converted;
        Ok(())
    }

    /// Serializes the document, XML declaration included
    pub fn to_xml(&self) -> Result<Vec<u8>, EpubError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        write_event(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
        )?;
        write_event(
            &mut writer,
            Event::Start(start_tag(&self.name, &self.attributes)),
        )?;

        self.write_metadata(&mut writer)?;
        self.write_manifest(&mut writer)?;
        self.write_spine(&mut writer)?;

        for element in &self.others {
            write_element(&mut writer, element)?;
        }

        write_event(&mut writer, Event::End(BytesEnd::new(self.name.as_str())))?;

        Ok(writer.into_inner().into_inner())
    }

    fn write_metadata(&self, writer: &mut XmlWriter) -> Result<(), EpubError> {
        let metadata = &self.metadata;
        write_event(
            writer,
            Event::Start(start_tag(&metadata.name, &metadata.attributes)),
        )?;

        let fields = metadata
            .title
            .iter()
            .chain(metadata.description.iter())
            .chain(metadata.creators.iter());
        for field in fields {
            write_text_element(writer, &field.name, &field.attributes, &field.text)?;
        }

        for element in &metadata.others {
            write_element(writer, element)?;
        }

        write_event(writer, Event::End(BytesEnd::new(metadata.name.as_str())))
    }

    fn write_manifest(&self, writer: &mut XmlWriter) -> Result<(), EpubError> {
        let manifest = &self.manifest;
        write_event(
            writer,
            Event::Start(start_tag(&manifest.name, &manifest.attributes)),
        )?;

        for item in &manifest.items {
            let mut attributes = vec![
                Attribute::new("id", &item.id),
                Attribute::new("href", &item.href),
                Attribute::new("media-type", &item.media_type),
            ];
            if let Some(properties) = &item.properties {
                attributes.push(Attribute::new("properties", properties));
            }
            if let Some(title) = &item.title {
                attributes.push(Attribute::new("title", title));
            }
            attributes.extend(item.extra.iter().cloned());

            write_event(writer, Event::Empty(start_tag(&item.name, &attributes)))?;
        }
        for element in &manifest.others {
            write_element(writer, element)?;
        }

        write_event(writer, Event::End(BytesEnd::new(manifest.name.as_str())))
    }

    fn write_spine(&self, writer: &mut XmlWriter) -> Result<(), EpubError> {
        let spine = &self.spine;
        write_event(writer, Event::Start(start_tag(&spine.name, &spine.attributes)))?;

        for itemref in &spine.itemrefs {
            let mut attributes = vec![Attribute::new("idref", &itemref.idref)];
            attributes.extend(itemref.extra.iter().cloned());

            write_event(writer, Event::Empty(start_tag(&itemref.name, &attributes)))?;
        }
        for element in &spine.others {
            write_element(writer, element)?;
        }

        write_event(writer, Event::End(BytesEnd::new(spine.name.as_str())))
    }
}

/// Converts an OPF file in place
///
/// The file is read, parsed, converted and serialized entirely in memory; it is
/// only overwritten once all of that has succeeded, so a failure at any step
/// leaves the original file on disk untouched.
pub fn convert_opf_file<P, C>(path: P, converter: &C) -> Result<(), EpubError>
where
    P: AsRef<Path>,
    C: TextConverter + ?Sized,
{
    let path = path.as_ref();
    info!("Converting: {}", path.display());

    let data = fs::read(path).map_err(|err| EpubError::filesystem(path, err))?;
    let mut package = PackageDocument::parse(&data.decode()?)?;
    package.convert(converter)?;
    let output = package.to_xml()?;

    fs::write(path, output).map_err(|err| EpubError::filesystem(path, err))
}

/// Builds an element tree from XML text
///
/// Text is unescaped; whitespace-only text is dropped. CDATA is taken as is.
fn parse_tree(content: &str) -> Result<Element, EpubError> {
    let mut reader = Reader::from_str(content);

    let mut stack = Vec::<Element>::new();
    let mut root = None;

    loop {
        match reader.read_event()? {
            Event::Eof => break,

            Event::Start(e) => stack.push(new_element(&e)?),

            Event::Empty(e) => {
                let element = new_element(&e)?;
                attach(&mut stack, &mut root, element)?;
            }

            Event::End(_) => {
                // End names are checked by the reader, so the stack cannot be empty here
                if let Some(mut element) = stack.pop() {
                    if element.text.trim().is_empty() {
                        element.text.clear();
                    }
                    attach(&mut stack, &mut root, element)?;
                }
            }

            Event::Text(e) => {
                if let Some(element) = stack.last_mut() {
                    let raw = String::from_utf8_lossy(&e);
                    element.text.push_str(&unescape(&raw)?);
                }
            }

            Event::GeneralRef(e) => {
                if let Some(element) = stack.last_mut() {
                    let reference = format!("&{};", String::from_utf8_lossy(&e));
                    element.text.push_str(&unescape(&reference)?);
                }
            }

            Event::CData(e) => {
                if let Some(element) = stack.last_mut() {
                    element.text.push_str(&String::from_utf8_lossy(&e));
                }
            }

            // Declaration, comments, processing instructions and doctype
            _ => continue,
        }
    }

    if let Some(element) = stack.last() {
        return Err(EpubError::MetadataParseError {
            reason: format!("The \"{}\" element is not closed.", element.name),
        });
    }

    root.ok_or_else(|| EpubError::MetadataParseError {
        reason: "The document has no root element.".to_string(),
    })
}

fn new_element(start: &BytesStart) -> Result<Element, EpubError> {
    let mut element = Element::new(&String::from_utf8_lossy(start.name().as_ref()));

    for attr in start.attributes() {
        let attr = attr.map_err(|err| EpubError::MetadataParseError {
            reason: err.to_string(),
        })?;
        let name = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let raw_value = String::from_utf8_lossy(&attr.value);

        element.attributes.push(Attribute {
            name,
            value: unescape(&raw_value)?.to_string(),
        });
    }

    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), EpubError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else if root.is_none() {
        *root = Some(element);
    } else {
        return Err(EpubError::MetadataParseError {
            reason: format!(
                "Unexpected \"{}\" element after the root element.",
                element.name
            ),
        });
    }

    Ok(())
}

fn parse_metadata(element: Element) -> Metadata {
    let mut metadata = Metadata {
        name: element.name,
        attributes: element.attributes,
        ..Default::default()
    };

    for child in element.children {
        let tag = local_name(&child.name).to_string();
        match tag.as_str() {
            "title" if metadata.title.is_none() => metadata.title = Some(into_field(child)),
            "description" if metadata.description.is_none() => {
                metadata.description = Some(into_field(child))
            }
            "creator" => metadata.creators.push(into_field(child)),
            _ => metadata.others.push(child),
        }
    }

    metadata
}

fn into_field(element: Element) -> MetadataField {
    if !element.children.is_empty() {
        warn!(
            "Nested elements inside \"{}\" are not kept",
            element.name
        );
    }

    MetadataField {
        name: element.name,
        attributes: element.attributes,
        text: element.text,
    }
}

fn parse_manifest(element: Element) -> Result<Manifest, EpubError> {
    const TYPED: [&str; 5] = ["id", "href", "media-type", "properties", "title"];

    let mut manifest = Manifest {
        name: element.name,
        attributes: element.attributes,
        items: Vec::with_capacity(element.children.len()),
        others: vec![],
    };

    for child in element.children {
        if local_name(&child.name) != "item" {
            manifest.others.push(child);
            continue;
        }

        let mut item = ManifestItem {
            name: child.name.clone(),
            id: required_attribute(&child, "id")?,
            href: required_attribute(&child, "href")?,
            media_type: required_attribute(&child, "media-type")?,
            properties: find_attribute(&child.attributes, "properties").map(str::to_string),
            title: find_attribute(&child.attributes, "title").map(str::to_string),
            extra: vec![],
        };

        item.extra = child
            .attributes
            .into_iter()
            .filter(|attr| !TYPED.contains(&attr.local_name()))
            .collect();

        manifest.items.push(item);
    }

    Ok(manifest)
}

fn parse_spine(element: Element) -> Result<Spine, EpubError> {
    let mut spine = Spine {
        name: element.name,
        attributes: element.attributes,
        itemrefs: Vec::with_capacity(element.children.len()),
        others: vec![],
    };

    for child in element.children {
        if local_name(&child.name) != "itemref" {
            spine.others.push(child);
            continue;
        }

        let idref = required_attribute(&child, "idref")?;
        let extra = child
            .attributes
            .into_iter()
            .filter(|attr| attr.local_name() != "idref")
            .collect();

        spine.itemrefs.push(SpineItem {
            name: child.name,
            idref,
            extra,
        });
    }

    Ok(spine)
}

fn required_attribute(element: &Element, name: &str) -> Result<String, EpubError> {
    find_attribute(&element.attributes, name)
        .map(str::to_string)
        .ok_or_else(|| EpubError::MissingRequiredAttribute {
            tag: element.name.clone(),
            attribute: name.to_string(),
        })
}

fn start_tag<'a>(name: &'a str, attributes: &'a [Attribute]) -> BytesStart<'a> {
    BytesStart::new(name).with_attributes(
        attributes
            .iter()
            .map(|attr| (attr.name.as_str(), attr.value.as_str())),
    )
}

fn write_text_element(
    writer: &mut XmlWriter,
    name: &str,
    attributes: &[Attribute],
    text: &str,
) -> Result<(), EpubError> {
    if text.is_empty() {
        return write_event(writer, Event::Empty(start_tag(name, attributes)));
    }

    write_event(writer, Event::Start(start_tag(name, attributes)))?;
    write_event(writer, Event::Text(BytesText::new(text)))?;
    write_event(writer, Event::End(BytesEnd::new(name)))
}

fn write_element(writer: &mut XmlWriter, element: &Element) -> Result<(), EpubError> {
    if element.children.is_empty() {
        return write_text_element(writer, &element.name, &element.attributes, &element.text);
    }

    write_event(
        writer,
        Event::Start(start_tag(&element.name, &element.attributes)),
    )?;
    if !element.text.is_empty() {
        write_event(writer, Event::Text(BytesText::new(&element.text)))?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    write_event(writer, Event::End(BytesEnd::new(element.name.as_str())))
}

fn write_event(writer: &mut XmlWriter, event: Event) -> Result<(), EpubError> {
    writer
        .write_event(event)
        .map_err(|err| EpubError::MetadataWriteError {
            reason: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::{
        convert::{Ruleset, ScriptConverter},
        error::EpubError,
        opf::convert_opf_file,
        types::{ManifestItem, MetadataField, PackageDocument},
    };

    const OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="pub-id">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
    <dc:identifier id="pub-id">urn:uuid:1234</dc:identifier>
    <dc:title>繁體標題</dc:title>
    <dc:language>zh-TW</dc:language>
    <dc:creator opf:role="aut">魯迅</dc:creator>
    <dc:creator opf:role="trl">張愛玲</dc:creator>
    <dc:description>這是一本書 &amp; 說明</dc:description>
    <meta property="dcterms:modified">2024-01-01T00:00:00Z</meta>
  </metadata>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="ch1" href="text/ch1.xhtml" media-type="application/xhtml+xml" properties="title" title="繁體"/>
    <item id="ch2" href="text/ch2.xhtml" media-type="application/xhtml+xml" title="體驗" fallback="ch1"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="ch1"/>
    <itemref idref="ch2" linear="no"/>
  </spine>
  <guide>
    <reference type="cover" title="封面" href="cover.xhtml"/>
  </guide>
</package>
"#;

    #[test]
    fn test_parse_package() {
        let package = PackageDocument::parse(OPF).unwrap();

        assert_eq!(package.name, "package");
        assert_eq!(package.attributes.len(), 3);

        let title = package.metadata.title.as_ref().unwrap();
        assert_eq!(title.name, "dc:title");
        assert_eq!(title.text, "繁體標題");

        let description = package.metadata.description.as_ref().unwrap();
        assert_eq!(description.text, "這是一本書 & 說明");

        assert_eq!(package.metadata.creators.len(), 2);
        assert_eq!(package.metadata.creators[0].text, "魯迅");
        assert_eq!(package.metadata.creators[0].role(), Some("aut"));
        assert_eq!(package.metadata.creators[1].role(), Some("trl"));
        assert_eq!(package.metadata.others.len(), 3);

        assert_eq!(package.manifest.items.len(), 3);
        let ch2 = &package.manifest.items[2];
        assert_eq!(ch2.href, "text/ch2.xhtml");
        assert_eq!(ch2.properties, None);
        assert_eq!(ch2.title.as_deref(), Some("體驗"));
        assert_eq!(ch2.extra[0].name, "fallback");

        assert_eq!(package.spine.attributes[0].value, "ncx");
        assert_eq!(package.spine.itemrefs[1].idref, "ch2");
        assert_eq!(package.spine.itemrefs[1].extra[0].value, "no");

        assert_eq!(package.others.len(), 1);
        assert_eq!(package.others[0].name, "guide");
    }

    #[test]
    fn test_convert_selected_fields() {
        let mut package = PackageDocument::parse(OPF).unwrap();
        let converter = ScriptConverter::new(Ruleset::TraditionalToSimplified);
        package.convert(&converter).unwrap();

        assert_eq!(package.metadata.title.as_ref().unwrap().text, "繁体标题");
        assert_eq!(
            package.metadata.description.as_ref().unwrap().text,
            "这是一本书 & 说明"
        );
        assert_eq!(package.metadata.creators[0].text, "鲁迅");
        assert_eq!(package.metadata.creators[1].text, "张爱玲");
        assert_eq!(package.metadata.creators[0].role(), Some("aut"));

        // Only the item flagged with `properties="title"` is converted
        assert_eq!(package.manifest.items[1].title.as_deref(), Some("繁体"));
        assert_eq!(package.manifest.items[2].title.as_deref(), Some("體驗"));

        // Passthrough elements are not converted
        let guide_reference = &package.others[0].children[0];
        assert_eq!(guide_reference.attributes[1].value, "封面");
    }

    #[test]
    fn test_convert_is_all_or_nothing() {
        let mut package = PackageDocument::parse(OPF).unwrap();
        let before = package.clone();

        let fail_on_creator = |text: &str| -> Result<String, EpubError> {
            if text == "張愛玲" {
                Err(EpubError::ConversionError {
                    ruleset: "test".to_string(),
                    reason: "unconvertible".to_string(),
                })
            } else {
                Ok(text.replace('體', "体"))
            }
        };

        assert!(package.convert(&fail_on_creator).is_err());
        assert_eq!(package, before);
    }

    #[test]
    fn test_round_trip_preserves_untouched_fields() {
        let package = PackageDocument::parse(OPF).unwrap();
        let output = String::from_utf8(package.to_xml().unwrap()).unwrap();
        let reparsed = PackageDocument::parse(&output).unwrap();

        assert_eq!(package, reparsed);
    }

    #[test]
    fn test_serialized_layout() {
        let mut package = PackageDocument::parse(OPF).unwrap();
        package
            .convert(&ScriptConverter::new(Ruleset::TraditionalToSimplified))
            .unwrap();
        let output = String::from_utf8(package.to_xml().unwrap()).unwrap();

        assert!(output.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(output.contains("\n  <metadata "));
        assert!(output.contains("\n    <dc:title>繁体标题</dc:title>"));
        assert!(output.contains(r#"<dc:creator opf:role="aut">鲁迅</dc:creator>"#));
        assert!(output.contains(
            r#"<item id="ch1" href="text/ch1.xhtml" media-type="application/xhtml+xml" properties="title" title="繁体"/>"#
        ));
        assert!(output.contains(r#"<itemref idref="ch2" linear="no"/>"#));
        assert!(output.contains("&amp;"));
    }

    #[test]
    fn test_parse_malformed() {
        let result = PackageDocument::parse("<package><metadata><dc:title>x</metadata></package>");
        assert!(matches!(
            result.unwrap_err(),
            EpubError::MetadataParseError { .. }
        ));

        let result = PackageDocument::parse("<package><metadata>");
        assert!(matches!(
            result.unwrap_err(),
            EpubError::MetadataParseError { .. }
        ));

        let result = PackageDocument::parse("");
        assert!(matches!(
            result.unwrap_err(),
            EpubError::MetadataParseError { .. }
        ));
    }

    #[test]
    fn test_parse_wrong_root() {
        let result = PackageDocument::parse("<container><rootfiles/></container>");
        assert!(matches!(
            result.unwrap_err(),
            EpubError::MetadataParseError { .. }
        ));
    }

    #[test]
    fn test_parse_missing_item_attribute() {
        let result = PackageDocument::parse(
            r#"<package><manifest><item id="a" media-type="text/css"/></manifest></package>"#,
        );
        assert_eq!(
            result.unwrap_err(),
            EpubError::MissingRequiredAttribute {
                tag: "item".to_string(),
                attribute: "href".to_string()
            }
        );
    }

    #[test]
    fn test_parse_without_sections() {
        let package = PackageDocument::parse("<package version=\"2.0\"/>").unwrap();
        assert!(package.metadata.title.is_none());
        assert!(package.manifest.items.is_empty());

        let output = String::from_utf8(package.to_xml().unwrap()).unwrap();
        assert!(output.contains("<metadata>"));
        assert!(output.contains("</package>"));
    }

    #[test]
    fn test_convert_opf_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("content.opf");
        fs::write(&path, OPF).unwrap();

        let converter = ScriptConverter::new(Ruleset::TraditionalToSimplified);
        convert_opf_file(&path, &converter).unwrap();

        let output = fs::read_to_string(&path).unwrap();
        assert!(output.contains("繁体标题"));
        assert!(output.contains(r#"href="text/ch1.xhtml""#));
        assert!(output.contains(r#"title="繁体""#));
        assert!(output.contains(r#"title="體驗""#));
    }

    #[test]
    fn test_convert_opf_file_malformed_is_untouched() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("content.opf");
        let malformed = "<package><metadata><dc:title>繁體</dc:title></package>";
        fs::write(&path, malformed).unwrap();

        let converter = ScriptConverter::new(Ruleset::TraditionalToSimplified);
        let result = convert_opf_file(&path, &converter);

        assert!(matches!(
            result.unwrap_err(),
            EpubError::MetadataParseError { .. }
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), malformed);
    }

    #[test]
    fn test_convert_constructed_document() {
        let mut doc = PackageDocument::default();
        doc.name = "package".to_string();
        doc.metadata.name = "metadata".to_string();
        doc.metadata.title = Some(MetadataField::new("dc:title", "繁體"));
        doc.manifest.name = "manifest".to_string();
        doc.manifest.items = vec![
            ManifestItem::new("ch1", "text/ch1.xhtml", "application/xhtml+xml")
                .with_properties("title")
                .with_title("標題"),
            ManifestItem::new("ch2", "text/ch2.xhtml", "application/xhtml+xml").with_title("標題"),
        ];
        doc.spine.name = "spine".to_string();

        doc.convert(&ScriptConverter::new(Ruleset::TraditionalToSimplified))
            .unwrap();

        let xml = String::from_utf8(doc.to_xml().unwrap()).unwrap();
        assert!(xml.contains("<dc:title>繁体</dc:title>"));
        assert!(xml.contains(
            "<item id=\"ch1\" href=\"text/ch1.xhtml\" media-type=\"application/xhtml+xml\" properties=\"title\" title=\"标题\"/>"
        ));
        assert!(xml.contains(
            "<item id=\"ch2\" href=\"text/ch2.xhtml\" media-type=\"application/xhtml+xml\" title=\"標題\"/>"
        ));
    }

    const PREFIXED_OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<opf:package xmlns:opf="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="uid">
  <opf:metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>繁體</dc:title>
    <dc:identifier id="uid">urn:uuid:1</dc:identifier>
  </opf:metadata>
  <opf:manifest>
    <opf:item id="a" href="a.xhtml" media-type="application/xhtml+xml"/>
  </opf:manifest>
  <opf:spine>
    <opf:itemref idref="a"/>
  </opf:spine>
</opf:package>"#;

    #[test]
    fn test_prefixed_package_serializes_identically() {
        let package = PackageDocument::parse(PREFIXED_OPF).unwrap();
        assert_eq!(package.manifest.items[0].name, "opf:item");
        assert_eq!(package.spine.itemrefs[0].name, "opf:itemref");

        let output = String::from_utf8(package.to_xml().unwrap()).unwrap();
        assert_eq!(output, PREFIXED_OPF);
    }

    #[test]
    fn test_manifest_and_spine_keep_other_children() {
        let package = PackageDocument::parse(
            r#"<package><manifest><item id="a" href="a.xhtml" media-type="application/xhtml+xml"/><extension name="x"/></manifest><spine><itemref idref="a"/><note>keep</note></spine></package>"#,
        )
        .unwrap();

        assert_eq!(package.manifest.items.len(), 1);
        assert_eq!(package.manifest.others[0].name, "extension");
        assert_eq!(package.spine.itemrefs.len(), 1);
        assert_eq!(package.spine.others[0].text, "keep");

        let output = String::from_utf8(package.to_xml().unwrap()).unwrap();
        assert!(output.contains(r#"<extension name="x"/>"#));
        assert!(output.contains("<note>keep</note>"));
    }

    #[test]
    fn test_text_whitespace_is_kept() {
        let mut package = PackageDocument::parse(
            "<package>\n  <metadata>\n    <dc:title>  繁體  </dc:title>\n    <dc:subject> 歷史 </dc:subject>\n  </metadata>\n</package>",
        )
        .unwrap();

        assert_eq!(package.metadata.title.as_ref().unwrap().text, "  繁體  ");
        assert_eq!(package.metadata.others[0].text, " 歷史 ");

        package
            .convert(&ScriptConverter::new(Ruleset::TraditionalToSimplified))
            .unwrap();
        let output = String::from_utf8(package.to_xml().unwrap()).unwrap();
        assert!(output.contains("<dc:title>  繁体  </dc:title>"));
        assert!(output.contains("<dc:subject> 歷史 </dc:subject>"));
    }

    #[test]
    fn test_metadata_fields_written_before_other_children() {
        let package = PackageDocument::parse(OPF).unwrap();
        let output = String::from_utf8(package.to_xml().unwrap()).unwrap();

        let position = |needle: &str| output.find(needle).unwrap();
        assert!(position("<dc:title>") < position("<dc:description>"));
        assert!(position("<dc:description>") < position("<dc:creator "));
        assert!(position("<dc:creator ") < position("<dc:identifier "));
        assert!(position("<dc:identifier ") < position("<dc:language>"));
        assert!(position("<dc:language>") < position("<meta "));
    }
}

//! Package document model
//!
//! A flat, typed record of an OPF package document. Fields that may be converted
//! (title, description, creator text, flagged manifest titles) are plain strings;
//! everything else is carried verbatim so a parse/serialize round trip leaves it
//! unchanged.

/// A single XML attribute, keyed by its qualified name (`opf:role`, `xmlns:dc`, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    /// The attribute name without its namespace prefix
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }
}

/// Strips the namespace prefix from a qualified name
pub(crate) fn local_name(qualified: &str) -> &str {
    match qualified.split_once(':') {
        Some((_, local)) => local,
        None => qualified,
    }
}

/// Finds the value of the first attribute whose local name matches
pub(crate) fn find_attribute<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|attr| attr.local_name() == name)
        .map(|attr| attr.value.as_str())
}

/// A text-only metadata element such as `<dc:title>` or `<dc:creator>`
///
/// Title, description and creator entries share this shape: a qualified tag name,
/// the attributes in document order, and the text content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataField {
    /// The qualified tag name, e.g. `dc:creator`
    pub name: String,

    pub attributes: Vec<Attribute>,

    /// The text content, unescaped
    pub text: String,
}

impl MetadataField {
    pub fn new(name: &str, text: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: vec![],
            text: text.to_string(),
        }
    }

    /// Append an attribute
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    /// The creator role, read from a `role` attribute in any namespace
    pub fn role(&self) -> Option<&str> {
        find_attribute(&self.attributes, "role")
    }
}

/// An element carried through the conversion untouched
///
/// Used for the parts of the package document that are neither converted nor
/// addressed by the typed model: `dc:identifier`, `dc:language`, `meta`, `guide`, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,

    /// Character data directly inside the element, unescaped
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: vec![],
            text: String::new(),
            children: vec![],
        }
    }
}

/// The `<metadata>` section of the package document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// The qualified tag name; `metadata` unless the document uses a prefix
    pub name: String,
    pub attributes: Vec<Attribute>,

    /// The first title element; converted
    pub title: Option<MetadataField>,

    /// The first description element; converted
    pub description: Option<MetadataField>,

    /// Creator elements in document order; their text is converted
    pub creators: Vec<MetadataField>,

    /// Every other metadata child in document order; untouched
    pub others: Vec<Element>,
}

/// A resource declared in the `<manifest>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    /// The qualified tag name; `item` unless the document uses a prefix
    pub name: String,
    pub id: String,
    pub href: String,
    pub media_type: String,
    pub properties: Option<String>,

    /// Display title; converted only when `properties` is exactly `"title"`
    pub title: Option<String>,

    /// Remaining attributes (`fallback`, `media-overlay`, ...) in document order
    pub extra: Vec<Attribute>,
}

impl ManifestItem {
    pub fn new(id: &str, href: &str, media_type: &str) -> Self {
        Self {
            name: "item".to_string(),
            id: id.to_string(),
            href: href.to_string(),
            media_type: media_type.to_string(),
            properties: None,
            title: None,
            extra: vec![],
        }
    }

    pub fn with_properties(mut self, properties: &str) -> Self {
        self.properties = Some(properties.to_string());
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Whether the item's title is subject to conversion
    ///
    /// Only the literal property value `title` qualifies; a space separated
    /// list that merely contains `title` does not.
    pub fn has_title_flag(&self) -> bool {
        self.properties.as_deref() == Some("title")
    }
}

/// The `<manifest>` section of the package document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub items: Vec<ManifestItem>,

    /// Children other than items; written back after the items
    pub others: Vec<Element>,
}

/// An `<itemref>` of the spine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpineItem {
    /// The qualified tag name; `itemref` unless the document uses a prefix
    pub name: String,
    pub idref: String,

    /// Remaining attributes (`linear`, `properties`, ...) in document order
    pub extra: Vec<Attribute>,
}

impl SpineItem {
    pub fn new(idref: &str) -> Self {
        Self {
            name: "itemref".to_string(),
            idref: idref.to_string(),
            extra: vec![],
        }
    }
}

/// The `<spine>` section of the package document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spine {
    pub name: String,

    /// Spine attributes such as `toc` and `page-progression-direction`
    pub attributes: Vec<Attribute>,
    pub itemrefs: Vec<SpineItem>,

    /// Children other than itemrefs; written back after the itemrefs
    pub others: Vec<Element>,
}

/// An OPF package document
///
/// Constructed once per OPF file, mutated in memory by the conversion and
/// discarded after it has been serialized back to disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageDocument {
    /// The qualified root tag name; `package` unless the document uses a prefix
    pub name: String,

    /// Root attributes, including namespace declarations, in document order
    pub attributes: Vec<Attribute>,
    pub metadata: Metadata,
    pub manifest: Manifest,
    pub spine: Spine,

    /// Other package children (`guide`, `collection`, `bindings`, ...) in document order
    pub others: Vec<Element>,
}

//! Writes properties in the Hadoop XML configuration format (`hadoop-site.xml`).
//!
//! A document is produced in three phases that can be called separately on
//! the same sink: [`write_header`], [`write_body`], [`write_footer`].
//! [`serialize`] runs all three.
//!
//! ```text
//! <?xml version="1.0"?>
//! <?xml-stylesheet type="text/xsl" href="configuration.xsl"?>
//!
//! <!--
//!      Autogenerated by nodestrap 0.1.0 on
//!      Sat Oct 18 10:00:00 2026
//!      ...
//! -->
//! <configuration>
//! <property>
//!   <name>dfs.replication</name>
//!   <value>3</value>
//!   <final>true</final>
//! </property>
//! </configuration>
//! ```
//!
//! Values are written verbatim. Nothing is escaped, so a value containing
//! `<` or `&` yields a document the cluster software cannot parse; callers
//! must reject such values before serializing.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};

use camino::Utf8Path;
use chrono::{DateTime, Local};
use serde::Deserialize;

use crate::error::NodestrapError;

/// Property name to value, iterated in byte-wise key order.
pub type PropertyMapping<V = PropertyValue> = BTreeMap<String, V>;

/// Names of properties that site-level overrides may not change.
pub type FinalKeys = BTreeSet<String>;

/// Closing root element. Always the last bytes of a document.
pub const FOOTER: &str = "</configuration>\n";

/// A scalar property value, coerced to its string form when written.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl PropertyValue {
    /// Whether the written text matches how the value was spelled in YAML.
    ///
    /// Floats do not: `1.0`, `0.20` and `1e3` are parsed to `f64` and come
    /// back as `1`, `0.2` and `1000`. Inputs have to quote such values.
    pub fn is_verbatim(&self) -> bool {
        !matches!(self, Self::Float(_))
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Provenance written into the header comment.
///
/// The timestamp is informational. Nothing reads it back.
#[derive(Debug, Clone)]
pub struct Header {
    pub version: String,
    pub generated_at: DateTime<Local>,
}

impl Header {
    pub fn new(version: impl Into<String>, generated_at: DateTime<Local>) -> Self {
        Self {
            version: version.into(),
            generated_at,
        }
    }

    /// Header stamped with this crate's version and the current local time.
    pub fn now() -> Self {
        Self::new(env!("CARGO_PKG_VERSION"), Local::now())
    }
}

/// Writes the preamble and the opening `<configuration>` element.
pub fn write_header<W: Write + ?Sized>(w: &mut W, header: &Header) -> io::Result<()> {
    write!(
        w,
        r#"<?xml version="1.0"?>
<?xml-stylesheet type="text/xsl" href="configuration.xsl"?>

<!--
     Autogenerated by nodestrap {version} on
     {date}

     You *may* edit this file. Put site-specific property overrides below.
-->
<configuration>
"#,
        version = header.version,
        date = header.generated_at.format("%a %b %e %H:%M:%S %Y"),
    )
}

/// Writes one `<property>` record per key in ascending key order.
///
/// Keys in `final_keys` get a `<final>true</final>` child; others never do.
pub fn write_body<W, V>(
    w: &mut W,
    properties: &PropertyMapping<V>,
    final_keys: &FinalKeys,
) -> io::Result<()>
where
    W: Write + ?Sized,
    V: fmt::Display,
{
    for (name, value) in properties {
        write!(w, "<property>\n  <name>{}</name>\n  <value>{}</value>\n", name, value)?;
        if final_keys.contains(name) {
            w.write_all(b"  <final>true</final>\n")?;
        }
        w.write_all(b"</property>\n")?;
    }
    Ok(())
}

/// Writes the closing root element. Must be the last write to the sink.
pub fn write_footer<W: Write + ?Sized>(w: &mut W) -> io::Result<()> {
    w.write_all(FOOTER.as_bytes())
}

/// Writes a complete document: header, body, footer.
pub fn serialize<W, V>(
    w: &mut W,
    header: &Header,
    properties: &PropertyMapping<V>,
    final_keys: &FinalKeys,
) -> io::Result<()>
where
    W: Write + ?Sized,
    V: fmt::Display,
{
    write_header(w, header)?;
    write_body(w, properties, final_keys)?;
    write_footer(w)
}

/// Serializes into an in-memory buffer.
pub fn to_bytes<V: fmt::Display>(
    header: &Header,
    properties: &PropertyMapping<V>,
    final_keys: &FinalKeys,
) -> Vec<u8> {
    let mut buf = Vec::new();
    // Writing to a Vec cannot fail.
    let _ = serialize(&mut buf, header, properties, final_keys);
    buf
}

/// Creates (or truncates) `path` and writes a complete document to it.
pub fn write_file<V: fmt::Display>(
    path: &Utf8Path,
    header: &Header,
    properties: &PropertyMapping<V>,
    final_keys: &FinalKeys,
) -> Result<(), NodestrapError> {
    let file = File::create(path)
        .map_err(|e| NodestrapError::io(format!("failed to create {}", path), e))?;
    let mut writer = BufWriter::new(file);
    serialize(&mut writer, header, properties, final_keys)
        .and_then(|()| writer.flush())
        .map_err(|e| NodestrapError::io(format!("failed to write {}", path), e))?;
    tracing::info!("wrote {} propert(ies) to {}", properties.len(), path);
    Ok(())
}

/// Returns the first character in `value` that would corrupt the document.
pub fn unsafe_char(value: &str) -> Option<char> {
    value.chars().find(|c| matches!(c, '<' | '&'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_header() -> Header {
        let at = Local.with_ymd_and_hms(2026, 10, 18, 9, 5, 0).unwrap();
        Header::new("9.9.9", at)
    }

    #[test]
    fn header_carries_version_and_timestamp_in_comment() {
        let mut buf = Vec::new();
        write_header(&mut buf, &fixed_header()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\"?>\n"));
        assert!(text.contains("href=\"configuration.xsl\""));
        assert!(text.contains("Autogenerated by nodestrap 9.9.9 on"));
        assert!(text.contains("Sun Oct 18 09:05:00 2026"));
        assert!(text.ends_with("<configuration>\n"));
    }

    #[test]
    fn body_marks_only_final_keys() {
        let mut props = PropertyMapping::new();
        props.insert("fs.default.name".to_string(), PropertyValue::from("hdfs://nn:9000"));
        props.insert("dfs.replication".to_string(), PropertyValue::Integer(3));
        let finals: FinalKeys = ["dfs.replication".to_string()].into();

        let mut buf = Vec::new();
        write_body(&mut buf, &props, &finals).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "<property>\n  <name>dfs.replication</name>\n  <value>3</value>\n  <final>true</final>\n</property>\n\
             <property>\n  <name>fs.default.name</name>\n  <value>hdfs://nn:9000</value>\n</property>\n"
        );
    }

    #[test]
    fn empty_mapping_is_header_then_footer() {
        let props: PropertyMapping = PropertyMapping::new();
        let text = String::from_utf8(to_bytes(&fixed_header(), &props, &FinalKeys::new())).unwrap();
        assert!(text.ends_with("<configuration>\n</configuration>\n"));
        assert!(!text.contains("<property>"));
    }

    #[test]
    fn property_value_display() {
        assert_eq!(PropertyValue::Bool(true).to_string(), "true");
        assert_eq!(PropertyValue::Integer(-4).to_string(), "-4");
        assert_eq!(PropertyValue::Float(0.5).to_string(), "0.5");
        assert_eq!(PropertyValue::from("x").to_string(), "x");
    }

    #[test]
    fn floats_are_not_verbatim() {
        let parsed: PropertyMapping = serde_yaml::from_str("a: 0.20\nb: \"0.20\"\nc: 20\nd: true\n").unwrap();
        assert!(!parsed["a"].is_verbatim());
        assert_eq!(parsed["b"], PropertyValue::from("0.20"));
        assert!(parsed["b"].is_verbatim());
        assert!(parsed["c"].is_verbatim());
        assert!(parsed["d"].is_verbatim());
    }

    #[test]
    fn unsafe_char_detects_markup() {
        assert_eq!(unsafe_char("a<b"), Some('<'));
        assert_eq!(unsafe_char("a&b"), Some('&'));
        assert_eq!(unsafe_char("/usr/java/jdk"), None);
    }
}

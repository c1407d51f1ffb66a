//! Short-lived, single-object credentials issued by the console API.

use serde::Deserialize;

/// Pre-signed POST target for one object upload.
///
/// `fields` must be sent in issue order, before the file part.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UploadCredential {
    pub url: String,
    pub expires_in: u64,
    #[serde(default, deserialize_with = "fields_in_order")]
    pub fields: Vec<(String, String)>,
}

/// Pre-signed GET URL for one object download.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DownloadCredential {
    pub url: String,
    pub expires_in: u64,
}

/// The API sends form fields as a JSON object (or null). Keep the order the
/// server wrote them in.
fn fields_in_order<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct FieldsVisitor;

    impl<'de> serde::de::Visitor<'de> for FieldsVisitor {
        type Value = Vec<(String, String)>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a map of form fields or null")
        }

        fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_some<D2>(self, deserializer: D2) -> Result<Self::Value, D2::Error>
        where
            D2: serde::Deserializer<'de>,
        {
            deserializer.deserialize_map(self)
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: serde::de::MapAccess<'de>,
        {
            let mut out = Vec::new();
            while let Some((k, v)) = map.next_entry::<String, String>()? {
                out.push((k, v));
            }
            Ok(out)
        }
    }

    deserializer.deserialize_option(FieldsVisitor)
}

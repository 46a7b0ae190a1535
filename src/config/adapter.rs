//! Relay adapter configuration

use serde::Deserialize;

use crate::domain::foundation::Namespace;
use crate::domain::relay::{ChannelNamer, DEFAULT_DELIMITER, DEFAULT_PREFIX};

use super::error::ValidationError;

/// Channel naming and served namespaces.
#[derive(Debug, Clone, Deserialize)]
pub struct AdapterConfig {
    /// Channel prefix
    #[serde(default = "default_key")]
    pub key: String,

    /// Channel segment delimiter, a single non-alphanumeric ASCII character
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Namespaces to relay (comma-separated)
    #[serde(default = "default_namespaces")]
    pub namespaces: String,
}

impl AdapterConfig {
    /// The delimiter as a `char`, if it is exactly one valid character.
    pub fn delimiter_char(&self) -> Result<char, ValidationError> {
        let mut chars = self.delimiter.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii() && !c.is_ascii_alphanumeric() && !c.is_whitespace() => {
                Ok(c)
            }
            _ => Err(ValidationError::InvalidDelimiter(self.delimiter.clone())),
        }
    }

    /// Parsed namespace list, duplicates removed, order kept.
    ///
    /// A namespace may not contain the delimiter: its channel would collide
    /// with a room channel of a shorter namespace.
    pub fn namespace_list(&self) -> Result<Vec<Namespace>, ValidationError> {
        let delimiter = self.delimiter_char()?;
        let mut list: Vec<Namespace> = Vec::new();
        for raw in self.namespaces.split(',').map(str::trim) {
            if !raw.starts_with('/') {
                return Err(ValidationError::InvalidNamespace(raw.to_string()));
            }
            if raw.contains(delimiter) {
                return Err(ValidationError::NamespaceContainsDelimiter {
                    namespace: raw.to_string(),
                    delimiter,
                });
            }
            let namespace = Namespace::from(raw);
            if !list.contains(&namespace) {
                list.push(namespace);
            }
        }
        Ok(list)
    }

    pub fn channel_namer(&self) -> Result<ChannelNamer, ValidationError> {
        if self.key.is_empty() {
            return Err(ValidationError::EmptyPrefix);
        }
        Ok(ChannelNamer::new(self.key.clone(), self.delimiter_char()?))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.channel_namer()?;
        self.namespace_list()?;
        Ok(())
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            key: default_key(),
            delimiter: default_delimiter(),
            namespaces: default_namespaces(),
        }
    }
}

fn default_key() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}

fn default_namespaces() -> String {
    Namespace::ROOT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_channel_namer_default() {
        let config = AdapterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.channel_namer().unwrap(), ChannelNamer::default());
        assert_eq!(config.namespace_list().unwrap(), vec![Namespace::root()]);
    }

    #[test]
    fn test_namespace_list_parsing() {
        let config = AdapterConfig {
            namespaces: "/, /chat ,/chat,/admin".to_string(),
            ..Default::default()
        };
        let list = config.namespace_list().unwrap();
        assert_eq!(
            list,
            vec![
                Namespace::root(),
                Namespace::from("/chat"),
                Namespace::from("/admin")
            ]
        );
    }

    #[test]
    fn test_namespace_without_slash_rejected() {
        let config = AdapterConfig {
            namespaces: "/,chat".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidNamespace(ns)) if ns == "chat"
        ));
    }

    #[test]
    fn test_namespace_containing_delimiter_rejected() {
        let config = AdapterConfig {
            namespaces: "/a,/a.b".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::NamespaceContainsDelimiter { namespace, delimiter: '.' })
                if namespace == "/a.b"
        ));

        let config = AdapterConfig {
            namespaces: "/a,/a.b".to_string(),
            delimiter: "#".to_string(),
            ..Default::default()
        };
        assert_eq!(config.namespace_list().unwrap().len(), 2);
    }

    #[test]
    fn test_slash_delimiter_rejects_every_namespace() {
        let config = AdapterConfig {
            delimiter: "/".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::NamespaceContainsDelimiter { .. })
        ));
    }

    #[test]
    fn test_delimiter_validation() {
        for bad in ["", "ab", "x", "7", " ", "é"] {
            let config = AdapterConfig {
                delimiter: bad.to_string(),
                ..Default::default()
            };
            assert!(config.delimiter_char().is_err(), "accepted {:?}", bad);
        }

        let config = AdapterConfig {
            delimiter: "#".to_string(),
            ..Default::default()
        };
        assert_eq!(config.delimiter_char().unwrap(), '#');
    }

    #[test]
    fn test_empty_prefix_rejected() {
        let config = AdapterConfig {
            key: String::new(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::EmptyPrefix)));
    }
}

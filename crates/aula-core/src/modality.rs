//! Input modality selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// The kind of payload a request carries, selecting the handler pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Pdf,
    Image,
    Audio,
}

impl Modality {
    pub const ALL: [Modality; 4] = [
        Modality::Text,
        Modality::Pdf,
        Modality::Image,
        Modality::Audio,
    ];

    /// Wire name used in form fields and responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Pdf => "pdf",
            Modality::Image => "image",
            Modality::Audio => "audio",
        }
    }

}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Modality::Text),
            "pdf" => Ok(Modality::Pdf),
            "image" => Ok(Modality::Image),
            "audio" => Ok(Modality::Audio),
            other => Err(Error::Validation(format!(
                "unsupported modality '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names() {
        assert_eq!("text".parse::<Modality>().unwrap(), Modality::Text);
        assert_eq!(" PDF ".parse::<Modality>().unwrap(), Modality::Pdf);
        assert_eq!("image".parse::<Modality>().unwrap(), Modality::Image);
        assert_eq!("audio".parse::<Modality>().unwrap(), Modality::Audio);
    }

    #[test]
    fn rejects_unknown_modality() {
        let err = "video".parse::<Modality>().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn display_round_trips() {
        for modality in Modality::ALL {
            assert_eq!(
                modality.to_string().parse::<Modality>().unwrap(),
                modality
            );
        }
    }
}

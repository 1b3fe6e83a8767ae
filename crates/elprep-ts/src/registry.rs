use elprep_core::{PrepError, PrepResult};

use crate::segment::SegmentationBackend;

/// Registry of segmentation backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SegmentationKind {
    /// Built-in contiguous Ward clustering (feature `segmentation`)
    #[default]
    Agglomerative,
    /// External time-series aggregation package; recognized but never bundled
    Tsam,
}

impl SegmentationKind {
    pub fn from_str(input: &str) -> PrepResult<Self> {
        match input.to_ascii_lowercase().as_str() {
            "agglomerative" | "default" => Ok(SegmentationKind::Agglomerative),
            "tsam" => Ok(SegmentationKind::Tsam),
            other => Err(PrepError::Config(format!(
                "unknown segmentation backend '{}'; supported values: {}",
                other,
                Self::available().join(", ")
            ))),
        }
    }

    /// Instantiate the backend, or report that it is not part of this build.
    pub fn build_backend(self) -> PrepResult<Box<dyn SegmentationBackend>> {
        match self {
            #[cfg(feature = "segmentation")]
            SegmentationKind::Agglomerative => Ok(Box::new(crate::AgglomerativeSegmenter)),
            #[cfg(not(feature = "segmentation"))]
            SegmentationKind::Agglomerative => Err(PrepError::CapabilityUnavailable {
                capability: "segment aggregation".into(),
                hint: "rebuild elprep-ts with the `segmentation` feature".into(),
            }),
            SegmentationKind::Tsam => Err(PrepError::CapabilityUnavailable {
                capability: "segment aggregation via tsam".into(),
                hint: "no tsam binding is available; use the 'agglomerative' backend".into(),
            }),
        }
    }

    pub fn available() -> &'static [&'static str] {
        &["agglomerative", "tsam"]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentationKind::Agglomerative => "agglomerative",
            SegmentationKind::Tsam => "tsam",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names_parse() {
        assert_eq!(
            SegmentationKind::from_str("Agglomerative").unwrap(),
            SegmentationKind::Agglomerative
        );
        assert_eq!(SegmentationKind::from_str("tsam").unwrap(), SegmentationKind::Tsam);
        assert!(matches!(
            SegmentationKind::from_str("kmeans"),
            Err(PrepError::Config(_))
        ));
    }

    #[test]
    fn tsam_is_reported_unavailable() {
        let err = SegmentationKind::Tsam.build_backend().err().unwrap();
        assert!(err.is_capability_unavailable());
    }

    #[cfg(feature = "segmentation")]
    #[test]
    fn agglomerative_backend_builds() {
        let backend = SegmentationKind::default().build_backend().unwrap();
        assert_eq!(backend.name(), "agglomerative");
    }
}

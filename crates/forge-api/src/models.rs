/// A selectable image-editing model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoModel {
    pub id: &'static str,
    pub name: &'static str,
}

// Both entries resolve to the same backend model; the second label is a
// placeholder for a future tuned variant.
pub const PHOTO_MODELS: &[PhotoModel] = &[
    PhotoModel {
        id: "gemini-2.5-flash-image-preview",
        name: "Creative Edit",
    },
    PhotoModel {
        id: "gemini-2.5-flash-image-preview",
        name: "Subtle Adjust (Concept)",
    },
];

pub const DEFAULT_PHOTO_MODEL: &str = "gemini-2.5-flash-image-preview";

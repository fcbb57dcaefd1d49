//! Turning user intent into the instruction text sent to the providers.

use crate::error::{Error, Result};

pub const ADJUSTMENT_RANGE: std::ops::RangeInclusive<i16> = -100..=100;
pub const DURATION_RANGE: std::ops::RangeInclusive<u16> = 1..=180;
pub const DEFAULT_DURATION_SECS: u16 = 5;

/// Photo adjustments in percent, each within [`ADJUSTMENT_RANGE`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Adjustments {
    pub brightness: i16,
    pub contrast: i16,
    pub saturation: i16,
}

impl Adjustments {
    fn items(&self) -> [(&'static str, i16); 3] {
        [
            ("brightness", self.brightness),
            ("contrast", self.contrast),
            ("saturation", self.saturation),
        ]
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.items() {
            if !ADJUSTMENT_RANGE.contains(&value) {
                return Err(Error::Validation(format!(
                    "The {name} adjustment must be between -100 and 100."
                )));
            }
        }
        Ok(())
    }
}

/// `" Apply the following adjustments: brightness: +20%, ..."`, or nothing
/// when every adjustment is zero.
pub fn adjustment_clause(adjustments: &Adjustments) -> String {
    let items: Vec<String> = adjustments
        .items()
        .into_iter()
        .filter(|(_, value)| *value != 0)
        .map(|(name, value)| {
            let sign = if value > 0 { "+" } else { "" };
            format!("{name}: {sign}{value}%")
        })
        .collect();

    if items.is_empty() {
        String::new()
    } else {
        format!(" Apply the following adjustments: {}.", items.join(", "))
    }
}

pub fn edit_instruction(prompt: &str, adjustments: &Adjustments) -> String {
    format!("{}.{}", prompt.trim(), adjustment_clause(adjustments))
}

macro_rules! labelled_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            pub fn parse(value: &str) -> Option<Self> {
                let value = value.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|item| item.label().eq_ignore_ascii_case(value))
            }

            /// The next entry, wrapping around.
            pub fn cycle(self) -> Self {
                let index = Self::ALL.iter().position(|item| *item == self).unwrap_or(0);
                Self::ALL[(index + 1) % Self::ALL.len()]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

labelled_enum!(VideoQuality {
    Standard => "Standard",
    High => "High",
});

labelled_enum!(VideoStyle {
    Cinematic => "Cinematic",
    Realistic => "Realistic",
    Animated => "Animated",
    TimeLapse => "Time-lapse",
    Surreal => "Surreal",
    Dreamlike => "Dreamlike",
});

labelled_enum!(VideoEffect {
    None => "None",
    SlowMotion => "Slow-motion",
    FastForward => "Fast-forward",
    CinematicColorGrade => "Cinematic Color Grade",
    BlackAndWhite => "Black and White",
    VintageFilm => "Vintage Film",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoSettings {
    pub duration_secs: u16,
    pub quality: VideoQuality,
    pub style: VideoStyle,
    pub effect: VideoEffect,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_DURATION_SECS,
            quality: VideoQuality::High,
            style: VideoStyle::Cinematic,
            effect: VideoEffect::None,
        }
    }
}

impl VideoSettings {
    pub fn validate(&self) -> Result<()> {
        if DURATION_RANGE.contains(&self.duration_secs) {
            Ok(())
        } else {
            Err(Error::Validation(
                "Video duration must be between 1 and 180 seconds.".to_string(),
            ))
        }
    }
}

pub fn video_instruction(prompt: &str, settings: &VideoSettings) -> String {
    let core = format!(
        "a {}-second video of: {}",
        settings.duration_secs,
        prompt.trim()
    );
    let tail = format!(
        "in a {} style and {} quality",
        settings.style.label().to_lowercase(),
        settings.quality.label().to_lowercase()
    );

    match settings.effect {
        VideoEffect::None => format!("{core}, {tail}."),
        VideoEffect::SlowMotion => format!("A slow-motion version of {core}, {tail}."),
        VideoEffect::FastForward => format!("A fast-forward version of {core}, {tail}."),
        VideoEffect::CinematicColorGrade => {
            format!("{core} with a cinematic color grade, {tail}.")
        }
        VideoEffect::BlackAndWhite => format!("A black and white version of {core}, {tail}."),
        VideoEffect::VintageFilm => format!("{core} with a vintage film effect, {tail}."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn clause_lists_nonzero_adjustments_in_order() {
        let adjustments = Adjustments {
            brightness: 20,
            contrast: 0,
            saturation: -10,
        };
        assert_eq!(
            edit_instruction("  warmer tones ", &adjustments),
            "warmer tones. Apply the following adjustments: brightness: +20%, saturation: -10%."
        );
    }

    #[test]
    fn neutral_adjustments_leave_prompt_with_period() {
        assert_eq!(adjustment_clause(&Adjustments::default()), "");
        assert_eq!(
            edit_instruction("remove the background", &Adjustments::default()),
            "remove the background."
        );
    }

    #[test]
    fn out_of_range_adjustment_is_a_validation_error() {
        let adjustments = Adjustments {
            contrast: 101,
            ..Adjustments::default()
        };
        assert!(matches!(adjustments.validate(), Err(Error::Validation(_))));
        assert!(Adjustments { brightness: -100, contrast: 100, saturation: 0 }.validate().is_ok());
    }

    #[test]
    fn video_instruction_applies_effect_templates() {
        let mut settings = VideoSettings::default();
        assert_eq!(
            video_instruction("a fox in snow", &settings),
            "a 5-second video of: a fox in snow, in a cinematic style and high quality."
        );

        settings.effect = VideoEffect::SlowMotion;
        settings.style = VideoStyle::TimeLapse;
        settings.quality = VideoQuality::Standard;
        settings.duration_secs = 12;
        assert_eq!(
            video_instruction("city lights", &settings),
            "A slow-motion version of a 12-second video of: city lights, in a time-lapse style and standard quality."
        );

        settings.effect = VideoEffect::VintageFilm;
        assert_eq!(
            video_instruction("city lights", &settings),
            "a 12-second video of: city lights with a vintage film effect, in a time-lapse style and standard quality."
        );
    }

    #[test]
    fn duration_is_bounded() {
        let settings = VideoSettings {
            duration_secs: 0,
            ..VideoSettings::default()
        };
        assert!(settings.validate().is_err());
        assert!(VideoSettings { duration_secs: 180, ..settings }.validate().is_ok());
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!(VideoStyle::parse("time-lapse"), Some(VideoStyle::TimeLapse));
        assert_eq!(VideoEffect::parse("Black and White"), Some(VideoEffect::BlackAndWhite));
        assert_eq!(VideoQuality::High.cycle(), VideoQuality::Standard);
        assert_eq!(VideoQuality::parse("ultra"), None);
    }
}

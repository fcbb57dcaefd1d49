//! `:`-prefixed commands typed into the prompt line.

use std::path::PathBuf;

use forge_api::AspectRatio;
use forge_core::prompt::{ADJUSTMENT_RANGE, DURATION_RANGE};
use forge_core::{VideoEffect, VideoQuality, VideoStyle};

use crate::app::EditorMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Brightness,
    Contrast,
    Saturation,
}

/// Positions are zero-based here; users type them one-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Help,
    Mode(EditorMode),
    Open(Vec<PathBuf>),
    Remove(usize),
    Select(usize),
    Undo,
    Redo,
    Save { index: Option<usize>, path: PathBuf },
    Adjust(Adjustment, i16),
    ResetAdjustments,
    Model(usize),
    Count(u8),
    Aspect(AspectRatio),
    Duration(u16),
    Quality(VideoQuality),
    Style(VideoStyle),
    Effect(VideoEffect),
    StartImage(Option<PathBuf>),
    Suggestions,
    UseSuggestion(usize),
}

pub const HELP: &str = ":mode photo|generate|video  :open <files>  :select/:remove <n>  :undo  :redo  \
:save [n] <file>  :brightness/:contrast/:saturation <-100..100>  :reset  :model <n>  :count <1-4>  \
:aspect <ratio>  :duration <secs>  :quality/:style/:effect <name>  :start <file>|none  :suggest [n]  :quit";

pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "q" | "quit" => Command::Quit,
        "h" | "help" => Command::Help,
        "mode" => Command::Mode(
            EditorMode::parse(rest).ok_or_else(|| format!("Unknown mode \"{rest}\"."))?,
        ),
        "open" => {
            let paths: Vec<PathBuf> = rest.split_whitespace().map(PathBuf::from).collect();
            if paths.is_empty() {
                return Err("Usage: :open <file> [file...]".to_string());
            }
            Command::Open(paths)
        }
        "remove" | "rm" => Command::Remove(position(rest)?),
        "select" | "sel" => Command::Select(position(rest)?),
        "undo" => Command::Undo,
        "redo" => Command::Redo,
        "save" => save(rest)?,
        "brightness" => Command::Adjust(Adjustment::Brightness, adjustment(rest)?),
        "contrast" => Command::Adjust(Adjustment::Contrast, adjustment(rest)?),
        "saturation" => Command::Adjust(Adjustment::Saturation, adjustment(rest)?),
        "reset" => Command::ResetAdjustments,
        "model" => Command::Model(position(rest)?),
        "count" => match rest.parse::<u8>() {
            Ok(count) if (1..=4).contains(&count) => Command::Count(count),
            _ => return Err("Choose between 1 and 4 images.".to_string()),
        },
        "aspect" => Command::Aspect(AspectRatio::parse(rest).ok_or_else(|| {
            let options: Vec<&str> = AspectRatio::ALL.iter().map(|ratio| ratio.as_str()).collect();
            format!("Aspect ratio must be one of {}.", options.join(", "))
        })?),
        "duration" => match rest.trim_end_matches('s').parse::<u16>() {
            Ok(secs) if DURATION_RANGE.contains(&secs) => Command::Duration(secs),
            _ => return Err("Video duration must be between 1 and 180 seconds.".to_string()),
        },
        "quality" => Command::Quality(labelled(rest, VideoQuality::parse, VideoQuality::ALL)?),
        "style" => Command::Style(labelled(rest, VideoStyle::parse, VideoStyle::ALL)?),
        "effect" => Command::Effect(labelled(rest, VideoEffect::parse, VideoEffect::ALL)?),
        "start" => match rest {
            "" => return Err("Usage: :start <file>|none".to_string()),
            "none" => Command::StartImage(None),
            path => Command::StartImage(Some(PathBuf::from(path))),
        },
        "suggest" | "suggestions" => {
            if rest.is_empty() {
                Command::Suggestions
            } else {
                Command::UseSuggestion(position(rest)?)
            }
        }
        other => return Err(format!("Unknown command :{other}. Type :help for a list.")),
    };
    Ok(command)
}

fn position(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(format!("Expected a position starting at 1, got \"{value}\".")),
    }
}

fn adjustment(value: &str) -> Result<i16, String> {
    match value.trim_end_matches('%').parse::<i16>() {
        Ok(value) if ADJUSTMENT_RANGE.contains(&value) => Ok(value),
        _ => Err("Adjustments range from -100 to 100.".to_string()),
    }
}

fn save(rest: &str) -> Result<Command, String> {
    if rest.is_empty() {
        return Err("Usage: :save [n] <file>".to_string());
    }
    if let Some((first, path)) = rest.split_once(char::is_whitespace)
        && first.chars().all(|c| c.is_ascii_digit())
    {
        return Ok(Command::Save {
            index: Some(position(first)?),
            path: PathBuf::from(path.trim()),
        });
    }
    Ok(Command::Save {
        index: None,
        path: PathBuf::from(rest),
    })
}

fn labelled<T: std::fmt::Display>(
    value: &str,
    parse: fn(&str) -> Option<T>,
    all: &[T],
) -> Result<T, String> {
    parse(value).ok_or_else(|| {
        let options: Vec<String> = all.iter().map(ToString::to_string).collect();
        format!("Choose one of: {}.", options.join(", "))
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn positions_are_one_based() {
        assert_eq!(parse("select 2"), Ok(Command::Select(1)));
        assert_eq!(parse("rm 1"), Ok(Command::Remove(0)));
        assert!(parse("select 0").is_err());
    }

    #[test]
    fn adjustments_are_range_checked() {
        assert_eq!(
            parse("brightness 20"),
            Ok(Command::Adjust(Adjustment::Brightness, 20))
        );
        assert_eq!(
            parse("saturation -10%"),
            Ok(Command::Adjust(Adjustment::Saturation, -10))
        );
        assert_eq!(
            parse("contrast 150"),
            Err("Adjustments range from -100 to 100.".to_string())
        );
    }

    #[test]
    fn save_takes_optional_position() {
        assert_eq!(
            parse("save out/edit.png"),
            Ok(Command::Save {
                index: None,
                path: PathBuf::from("out/edit.png"),
            })
        );
        assert_eq!(
            parse("save 3 gallery.png"),
            Ok(Command::Save {
                index: Some(2),
                path: PathBuf::from("gallery.png"),
            })
        );
    }

    #[test]
    fn video_settings_parse_by_label() {
        assert_eq!(
            parse("effect black and white"),
            Ok(Command::Effect(VideoEffect::BlackAndWhite))
        );
        assert_eq!(parse("style Time-lapse"), Ok(Command::Style(VideoStyle::TimeLapse)));
        assert_eq!(parse("duration 12s"), Ok(Command::Duration(12)));
        assert!(parse("duration 181").is_err());
        assert_eq!(parse("start none"), Ok(Command::StartImage(None)));
    }

    #[test]
    fn generation_settings() {
        assert_eq!(parse("aspect 16:9"), Ok(Command::Aspect(AspectRatio::Landscape)));
        assert_eq!(parse("count 4"), Ok(Command::Count(4)));
        assert!(parse("count 5").is_err());
        assert_eq!(parse("mode video"), Ok(Command::Mode(EditorMode::Video)));
    }

    #[test]
    fn unknown_commands_are_reported() {
        assert_eq!(
            parse("frobnicate"),
            Err("Unknown command :frobnicate. Type :help for a list.".to_string())
        );
    }
}

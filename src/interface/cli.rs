use std::ffi::OsString;
use std::path::PathBuf;

use clap::App;

use crate::error::AppError;

/// Everything the command line controls.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub shader: PathBuf,
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub swap_interval: u32,
    pub frames: Option<u64>,
    pub color: [f32; 4],
}

impl Settings {
    pub fn from_args<I, T>(args: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let yaml = load_yaml!("cli.yaml");
        let matches = App::from_yaml(yaml).get_matches_from_safe(args)?;

        let width = value_t!(matches, "width", u32)?;
        let height = value_t!(matches, "height", u32)?;
        if width == 0 || height == 0 {
            return Err(AppError::InvalidArgument(format!(
                "window size must be non-zero, got {}x{}",
                width, height
            )));
        }

        let frames = if matches.is_present("frames") {
            Some(value_t!(matches, "frames", u64)?)
        } else {
            None
        };

        Ok(Self {
            shader: PathBuf::from(matches.value_of("shader").unwrap_or_default()),
            width,
            height,
            title: matches.value_of("title").unwrap_or_default().to_string(),
            swap_interval: value_t!(matches, "swap-interval", u32)?,
            frames,
            color: parse_color(matches.value_of("color").unwrap_or_default())?,
        })
    }
}

/// Parses `r,g,b,a` with each channel in `0.0..=1.0`.
fn parse_color(text: &str) -> Result<[f32; 4], AppError> {
    let invalid = || AppError::InvalidArgument(format!(
        "`{}` is not a colour; expected four comma-separated numbers between 0 and 1",
        text
    ));

    let channels = text
        .split(',')
        .map(|c| c.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;

    match channels.as_slice() {
        &[r, g, b, a] if channels.iter().all(|c| (0.0..=1.0).contains(c)) => Ok([r, g, b, a]),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_match_the_classic_window() {
        let settings = Settings::from_args(vec!["glquad"]).unwrap();

        assert_eq!(settings.shader, PathBuf::from("res/shaders/basic.shader"));
        assert_eq!((settings.width, settings.height), (640, 480));
        assert_eq!(settings.swap_interval, 1);
        assert_eq!(settings.frames, None);
        assert_eq!(settings.color, [0.2, 0.3, 0.8, 1.0]);
    }

    #[test]
    fn options_override_defaults() {
        let settings = Settings::from_args(vec![
            "glquad", "--shader", "other.shader", "--width", "800", "--height", "600",
            "--title", "Quad", "--swap-interval", "0", "--frames", "10", "--color", "1,0,0,0.5",
        ])
        .unwrap();

        assert_eq!(settings.shader, PathBuf::from("other.shader"));
        assert_eq!((settings.width, settings.height), (800, 600));
        assert_eq!(settings.title, "Quad");
        assert_eq!(settings.swap_interval, 0);
        assert_eq!(settings.frames, Some(10));
        assert_eq!(settings.color, [1.0, 0.0, 0.0, 0.5]);
    }

    #[test]
    fn bad_numbers_are_rejected() {
        assert!(Settings::from_args(vec!["glquad", "--width", "wide"]).is_err());
        assert!(Settings::from_args(vec!["glquad", "--height", "0"]).is_err());
    }

    #[test]
    fn colours_need_four_channels_in_range() {
        assert_eq!(parse_color(" 0, 0.5 ,1, 1").unwrap(), [0.0, 0.5, 1.0, 1.0]);
        assert!(parse_color("1,1,1").is_err());
        assert!(parse_color("1,1,1,2").is_err());
        assert!(parse_color("red").is_err());
    }
}

use std::{fs, path::PathBuf};

use clap::{
    Arg, ArgAction, ArgGroup,
    builder::{PathBufValueParser, PossibleValuesParser},
    command,
};
use color_eyre::eyre::{Result, WrapErr, bail, eyre};
use image::{RgbImage, imageops::FilterType};
use log::info;
use ntsc_artifacts::{
    NtscConfig, NtscProcessor, Preset,
    settings::{ParseSettingsError, SettingsList},
};

fn parse_settings(json: &str) -> Result<NtscConfig, ParseSettingsError> {
    SettingsList::<NtscConfig>::new().from_json(json)
}

/// Shrink `image` to fit within the given bounds, keeping its aspect ratio. Images that already fit are left alone.
fn fit_within(image: RgbImage, max_width: Option<u32>, max_height: Option<u32>) -> RgbImage {
    let (width, height) = image.dimensions();
    let scale_w = max_width.map_or(1.0, |max| max as f64 / width.max(1) as f64);
    let scale_h = max_height.map_or(1.0, |max| max as f64 / height.max(1) as f64);
    let scale = scale_w.min(scale_h);
    if scale >= 1.0 {
        return image;
    }

    let new_width = ((width as f64 * scale).round() as u32).max(1);
    let new_height = ((height as f64 * scale).round() as u32).max(1);
    info!("resizing {width}x{height} input to {new_width}x{new_height}");
    image::imageops::resize(&image, new_width, new_height, FilterType::Triangle)
}

pub fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let preset_names: Vec<&'static str> = Preset::ALL.iter().map(|preset| preset.name()).collect();

    let command = command!()
        .name("ntsc-artifacts")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_parser(PathBufValueParser::new())
                .help("Path to the input image.")
                .required_unless_present("dump-settings"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_parser(PathBufValueParser::new())
                .help("Path to write the processed image to. The format is picked from the extension.")
                .required_unless_present("dump-settings"),
        )
        .arg(
            Arg::new("overwrite")
                .short('y')
                .long("overwrite")
                .action(ArgAction::SetTrue)
                .help("If the output file already exists, overwrite it."),
        )
        .arg(
            Arg::new("preset")
                .long("preset")
                .value_parser(PossibleValuesParser::new(preset_names))
                .help("Start from one of the built-in presets."),
        )
        .arg(
            Arg::new("settings-path")
                .short('p')
                .long("settings-path")
                .value_parser(PathBufValueParser::new())
                .help("Path to a JSON effect settings preset."),
        )
        .arg(
            Arg::new("settings-json")
                .short('j')
                .long("settings-json")
                .help("JSON string for an effect settings preset.")
                .value_parser(parse_settings),
        )
        .arg(
            Arg::new("random-seed")
                .long("random-seed")
                .value_parser(clap::value_parser!(u32))
                .help("Generate random effect settings from this seed. 0 picks a seed from the clock."),
        )
        .group(ArgGroup::new("settings").args([
            "preset",
            "settings-path",
            "settings-json",
            "random-seed",
        ]))
        .arg(
            Arg::new("max-width")
                .long("max-width")
                .value_parser(clap::value_parser!(u32).range(1..))
                .help("Shrink the input to at most this many pixels wide before applying the effect."),
        )
        .arg(
            Arg::new("max-height")
                .long("max-height")
                .value_parser(clap::value_parser!(u32).range(1..))
                .help("Shrink the input to at most this many pixels tall before applying the effect."),
        )
        .arg(
            Arg::new("dump-settings")
                .long("dump-settings")
                .action(ArgAction::SetTrue)
                .help("Print the effect settings as JSON and exit."),
        );

    let matches = command.get_matches();

    let config = if let Some(settings_path) = matches.get_one::<PathBuf>("settings-path") {
        parse_settings(
            std::str::from_utf8(&fs::read(settings_path).wrap_err("Failed to open settings file")?)
                .wrap_err("Settings file is not valid UTF-8")?,
        )
        .wrap_err("Failed to parse settings file")?
    } else if let Some(config) = matches.get_one::<NtscConfig>("settings-json") {
        config.clone()
    } else if let Some(seed) = matches.get_one::<u32>("random-seed") {
        NtscConfig::random(*seed)
    } else if let Some(preset) = matches.get_one::<String>("preset") {
        NtscConfig::named_preset(preset)
    } else {
        NtscConfig::default()
    };

    if matches.get_flag("dump-settings") {
        let json = SettingsList::<NtscConfig>::new()
            .to_json_string(&config)
            .map_err(|err| eyre!("Failed to serialize settings: {err}"))?;
        println!("{json}");
        return Ok(());
    }

    let (Some(input_path), Some(output_path)) = (
        matches.get_one::<PathBuf>("input"),
        matches.get_one::<PathBuf>("output"),
    ) else {
        bail!("Both an input and an output path are required");
    };

    if output_path.exists() && !matches.get_flag("overwrite") {
        bail!(
            "Output file {} already exists. Pass --overwrite to replace it.",
            output_path.display()
        );
    }

    let input = image::open(input_path)
        .wrap_err_with(|| format!("Failed to open input image {}", input_path.display()))?
        .to_rgb8();
    let input = fit_within(
        input,
        matches.get_one::<u32>("max-width").copied(),
        matches.get_one::<u32>("max-height").copied(),
    );

    let mut processor = NtscProcessor::new(config);
    let output = processor.process(&input);
    output
        .save(output_path)
        .wrap_err_with(|| format!("Failed to write output image {}", output_path.display()))?;
    info!("wrote {}", output_path.display());

    Ok(())
}

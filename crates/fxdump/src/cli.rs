use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "fxdump",
    author,
    version,
    about = "Build the post-processing render graph and print it"
)]
pub struct Cli {
    /// Settings file; defaults to `postfx.toml` in the config directory when present.
    #[arg(long, value_name = "FILE", env = "FXDUMP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Scene and screen size (e.g. `1920x1080`). Zero dimensions are allowed.
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, default_value = "1920x1080")]
    pub size: (i32, i32),

    /// Shader-language version of the target (330, 400, 450, ...).
    #[arg(long, value_name = "VERSION", default_value_t = 330)]
    pub glsl: u32,

    /// Number of updates to run before printing; later frames show steady-state blending.
    #[arg(long, value_name = "N", default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub frames: u32,

    /// Emit JSON instead of text.
    #[arg(long)]
    pub json: bool,

    /// Print only the named effect list (e.g. `BloomScene`, `BlurScene`).
    #[arg(long, value_name = "NAME")]
    pub list: Option<String>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(i32, i32), String> {
    let trimmed = value.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WxH format, e.g. 1920x1080".to_string())?;

    let width: i32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width '{}' in size specification", width.trim()))?;
    let height: i32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height '{}' in size specification", height.trim()))?;

    if width < 0 || height < 0 {
        return Err("size dimensions must not be negative".to_string());
    }

    Ok((width, height))
}

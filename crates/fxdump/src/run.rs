use std::fmt;

use anyhow::{anyhow, Context, Result};
use fxconfig::FxConfig;
use fxgraph::{
    Binding, EffectList, FrameInfo, Pipeline, PixelFormat, ShaderDescriptor, Step, TargetCaps,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::paths::AppPaths;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let settings = config.into_settings();

    let (width, height) = cli.size;
    let frame = FrameInfo::fullscreen(width, height);
    let mut pipeline = Pipeline::new(TargetCaps::new(cli.glsl));
    for _ in 0..cli.frames {
        pipeline.update(&settings, &frame);
    }
    pipeline
        .validate()
        .context("render graph failed validation")?;

    let lists = select_lists(&pipeline, cli.list.as_deref())?;
    tracing::debug!(
        width,
        height,
        glsl = pipeline.caps().glsl_version,
        frames = cli.frames,
        lists = lists.len(),
        "render graph built"
    );

    let output = if cli.json {
        let report = Report::new(&pipeline, &frame, &lists);
        serde_json::to_string_pretty(&report).context("failed to serialise render graph")?
    } else {
        render_text(&pipeline, &frame, &lists)?
    };
    println!("{output}");
    Ok(())
}

fn load_config(cli: &Cli) -> Result<FxConfig> {
    if let Some(path) = &cli.config {
        return FxConfig::from_path(path)
            .with_context(|| format!("failed to load settings from {}", path.display()));
    }

    let paths = AppPaths::discover()?;
    let path = paths.config_file();
    if path.is_file() {
        tracing::info!(path = %path.display(), "using settings file");
        FxConfig::from_path(&path)
            .with_context(|| format!("failed to load settings from {}", path.display()))
    } else {
        tracing::debug!(
            config_dir = %paths.config_dir().display(),
            "no settings file found; using defaults"
        );
        Ok(FxConfig::default())
    }
}

fn select_lists<'a>(pipeline: &'a Pipeline, name: Option<&str>) -> Result<Vec<&'a EffectList>> {
    match name {
        Some(name) => {
            let list = pipeline
                .effect_list(name)
                .ok_or_else(|| anyhow!("unknown effect list '{name}'"))?;
            Ok(vec![list])
        }
        None => Ok(pipeline.render_graph().iter().collect()),
    }
}

#[derive(Serialize)]
struct Report<'a> {
    glsl_version: u32,
    frame: &'a FrameInfo,
    textures: Vec<TextureReport<'a>>,
    shaders: Vec<ShaderReport<'a>>,
    effects: &'a [&'a EffectList],
}

#[derive(Serialize)]
struct TextureReport<'a> {
    name: &'a str,
    width: u32,
    height: u32,
    format: PixelFormat,
    generation: u64,
    uploaded: bool,
}

#[derive(Serialize)]
struct ShaderReport<'a> {
    name: &'a str,
    #[serde(flatten)]
    descriptor: &'a ShaderDescriptor,
}

impl<'a> Report<'a> {
    fn new(pipeline: &'a Pipeline, frame: &'a FrameInfo, effects: &'a [&'a EffectList]) -> Self {
        let ctx = pipeline.context();
        let textures = ctx
            .textures()
            .iter()
            .map(|(name, desc)| TextureReport {
                name,
                width: desc.width,
                height: desc.height,
                format: desc.format,
                generation: ctx.textures().generation(name).unwrap_or_default(),
                uploaded: desc.has_data(),
            })
            .collect();
        let shaders = ctx
            .shaders()
            .iter()
            .map(|(name, descriptor)| ShaderReport { name, descriptor })
            .collect();

        Self {
            glsl_version: pipeline.caps().glsl_version,
            frame,
            textures,
            shaders,
            effects,
        }
    }
}

fn render_text(pipeline: &Pipeline, frame: &FrameInfo, lists: &[&EffectList]) -> Result<String> {
    let mut out = String::new();
    write_text(&mut out, pipeline, frame, lists).context("failed to format render graph")?;
    Ok(out.trim_end().to_string())
}

fn write_text(
    out: &mut impl fmt::Write,
    pipeline: &Pipeline,
    frame: &FrameInfo,
    lists: &[&EffectList],
) -> fmt::Result {
    writeln!(
        out,
        "scene {}x{}, glsl {}",
        frame.scene_width,
        frame.scene_height,
        pipeline.caps().glsl_version
    )?;

    for list in lists {
        if list.is_empty() {
            writeln!(out, "{} (disabled)", list.name)?;
            continue;
        }
        writeln!(out, "{} ({} steps)", list.name, list.len())?;
        for (index, step) in list.iter().enumerate() {
            writeln!(out, "  {index:>2} {}", describe_step(step))?;
        }
    }

    let textures = pipeline.context().textures();
    if !textures.is_empty() {
        writeln!(out, "textures:")?;
        for (name, desc) in textures.iter() {
            let uploaded = if desc.has_data() { " uploaded" } else { "" };
            writeln!(
                out,
                "  {name:<24} {:>5}x{:<5} {:?}{uploaded}",
                desc.width, desc.height, desc.format
            )?;
        }
    }
    Ok(())
}

fn describe_step(step: &Step) -> String {
    let inputs: Vec<String> = step
        .inputs
        .iter()
        .map(|input| format!("{}:{}/{:?}", input.slot, describe_binding(&input.binding), input.filter))
        .collect();
    let viewport = step.viewport;
    format!(
        "{:<18} {}x{}+{}+{} [{}] -> {} blend={:?}",
        step.shader,
        viewport.width,
        viewport.height,
        viewport.left,
        viewport.top,
        inputs.join(", "),
        describe_binding(&step.output),
        step.blend
    )
}

fn describe_binding(binding: &Binding) -> &str {
    match binding {
        Binding::Texture(name) => name.as_str(),
        Binding::Current => "CURRENT",
        Binding::Next => "NEXT",
    }
}

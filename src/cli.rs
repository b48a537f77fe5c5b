mod alloc;
mod formats;
mod layout;

use {
    crate::{
        allocator::{
            BO_USE_CURSOR, BO_USE_HW_VIDEO_DECODER, BO_USE_HW_VIDEO_ENCODER, BO_USE_LINEAR,
            BO_USE_RENDERING, BO_USE_SCANOUT, BO_USE_SW_READ_OFTEN, BO_USE_SW_WRITE_OFTEN,
            BO_USE_TEXTURE, BufferUsage,
        },
        driver::{Driver, DriverConfig},
        format::{Format, named_formats},
        logger::Logger,
        utils::errorfmt::ErrorFmt,
        video::{BROADCOM_VC4_T_TILED_MODIFIER, LINEAR_MODIFIER, Modifier, drm::Drm},
    },
    clap::{Args, Parser, Subcommand, ValueEnum},
    log::Level,
    std::rc::Rc,
};

/// Allocates buffers on VC4 GPUs.
#[derive(Parser, Debug)]
#[command(version)]
struct Minibo {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// The log level.
    #[arg(value_enum, long, default_value_t)]
    pub log_level: CliLogLevel,
    /// The backend to use instead of the one matching the kernel driver.
    #[arg(long, global = true)]
    pub backend: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Compute the layout of a buffer without allocating it.
    Layout(LayoutArgs),
    /// Print the format/usage combinations supported by a device.
    Formats(DeviceArgs),
    /// Allocate a buffer and print its layout.
    Alloc(AllocArgs),
}

#[derive(Args, Debug)]
pub struct DeviceArgs {
    /// The DRM device to open.
    #[arg(long, default_value = "/dev/dri/card0")]
    pub device: String,
}

#[derive(Args, Debug)]
pub struct BufferArgs {
    /// The pixel format, e.g. xrgb8888 or nv12.
    #[arg(long, value_parser = parse_format)]
    pub format: &'static Format,
    /// The width in pixels.
    #[arg(long)]
    pub width: u32,
    /// The height in pixels.
    #[arg(long)]
    pub height: u32,
}

#[derive(Args, Debug)]
pub struct LayoutArgs {
    #[command(flatten)]
    pub buffer: BufferArgs,
    /// The modifier to compute the layout for.
    #[arg(long, value_parser = parse_modifier, default_value = "linear")]
    pub modifier: Modifier,
}

#[derive(Args, Debug)]
pub struct AllocArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    #[command(flatten)]
    pub buffer: BufferArgs,
    /// Acceptable modifiers. Without this option, the modifier is chosen from the usage.
    ///
    /// Modifiers can be given by name (linear, vc4-t-tiled) or as hexadecimal numbers.
    #[arg(long, value_parser = parse_modifier, value_delimiter = ',')]
    pub modifiers: Vec<Modifier>,
    /// The intended usage of the buffer.
    #[arg(value_enum, long, value_delimiter = ',', default_value = "rendering")]
    pub usage: Vec<CliUsage>,
    /// Map the buffer and clear it.
    #[arg(long)]
    pub map: bool,
}

#[derive(ValueEnum, Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum CliUsage {
    Scanout,
    Cursor,
    Rendering,
    Linear,
    Texture,
    SwRead,
    SwWrite,
    VideoDecoder,
    VideoEncoder,
}

impl CliUsage {
    fn usage(self) -> BufferUsage {
        match self {
            CliUsage::Scanout => BO_USE_SCANOUT,
            CliUsage::Cursor => BO_USE_CURSOR,
            CliUsage::Rendering => BO_USE_RENDERING,
            CliUsage::Linear => BO_USE_LINEAR,
            CliUsage::Texture => BO_USE_TEXTURE,
            CliUsage::SwRead => BO_USE_SW_READ_OFTEN,
            CliUsage::SwWrite => BO_USE_SW_WRITE_OFTEN,
            CliUsage::VideoDecoder => BO_USE_HW_VIDEO_DECODER,
            CliUsage::VideoEncoder => BO_USE_HW_VIDEO_ENCODER,
        }
    }
}

fn usage_mask(usage: &[CliUsage]) -> BufferUsage {
    usage
        .iter()
        .fold(BufferUsage::none(), |acc, u| acc | u.usage())
}

#[derive(ValueEnum, Debug, Copy, Clone, Hash, Eq, PartialEq, Default)]
pub enum CliLogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<CliLogLevel> for Level {
    fn from(v: CliLogLevel) -> Self {
        match v {
            CliLogLevel::Trace => Level::Trace,
            CliLogLevel::Debug => Level::Debug,
            CliLogLevel::Info => Level::Info,
            CliLogLevel::Warn => Level::Warn,
            CliLogLevel::Error => Level::Error,
        }
    }
}

fn parse_format(s: &str) -> Result<&'static Format, String> {
    match named_formats().get(s.to_ascii_lowercase().as_str()) {
        Some(f) => Ok(*f),
        None => Err(format!("unknown format `{}`", s)),
    }
}

fn parse_modifier(s: &str) -> Result<Modifier, String> {
    match s {
        "linear" => return Ok(LINEAR_MODIFIER),
        "vc4-t-tiled" => return Ok(BROADCOM_VC4_T_TILED_MODIFIER),
        _ => {}
    }
    let hex = s.strip_prefix("0x").unwrap_or(s);
    Modifier::from_str_radix(hex, 16).map_err(|e| format!("invalid modifier `{}`: {}", s, e))
}

fn open_driver(global: &GlobalArgs, device: &DeviceArgs) -> (Rc<Drm>, Driver) {
    let drm = match Drm::open(&device.device) {
        Ok(d) => Rc::new(d),
        Err(e) => fatal!("Could not open the device: {}", ErrorFmt(e)),
    };
    let config = DriverConfig {
        backend: global.backend.clone(),
    };
    match Driver::new(&drm, &config) {
        Ok(d) => (drm, d),
        Err(e) => fatal!("Could not create a driver: {}", ErrorFmt(e)),
    }
}

pub fn main() {
    let cli = Minibo::parse();
    Logger::install_stderr(cli.global.log_level.into());
    match cli.command {
        Cmd::Layout(a) => layout::main(a),
        Cmd::Formats(a) => formats::main(&cli.global, a),
        Cmd::Alloc(a) => alloc::main(&cli.global, a),
    }
}

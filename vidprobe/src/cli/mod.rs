use anyhow::Result;
use clap::{Parser, Subcommand};

mod formats;
mod probe;

pub use formats::{FormatsCommand, ProtocolsCommand};
pub use probe::ProbeCommand;

#[derive(Parser, Debug)]
#[command(name = "vidprobe")]
#[command(about = "Inspect media sources and test-decode their streams")]
pub struct Args {
    /// Log state transitions (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show streams and metadata of a source, optionally decoding it
    Probe(ProbeCommand),
    /// List supported container formats
    Formats(FormatsCommand),
    /// List supported input protocols
    Protocols(ProtocolsCommand),
}

impl Args {
    pub fn init_logging(&self) {
        let default_filter = if self.verbose { "debug" } else { "warn" };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
            .init();

        // FFmpeg's own chatter, errors only
        ffmpeg_next::util::log::set_level(ffmpeg_next::util::log::Level::Error);
    }

    pub fn run(self) -> Result<()> {
        match self.command {
            Command::Probe(cmd) => cmd.run(),
            Command::Formats(cmd) => cmd.run(),
            Command::Protocols(cmd) => cmd.run(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ffmpeg_decode::HwDevice;

    #[test]
    fn parse_probe_arguments() {
        let args = Args::try_parse_from([
            "vidprobe",
            "-v",
            "probe",
            "-f v4l2 -i /dev/video0",
            "--decode",
            "--hw",
            "vaapi",
            "--frames",
            "10",
            "-o",
            "framerate=30",
        ])
        .unwrap();

        assert!(args.verbose);
        let Command::Probe(cmd) = args.command else {
            panic!("expected probe command");
        };
        assert_eq!(cmd.source, "-f v4l2 -i /dev/video0");
        assert!(cmd.decode);
        assert_eq!(cmd.hw, Some(Some(HwDevice::Vaapi)));
        assert_eq!(cmd.frames, 10);
        assert_eq!(cmd.options, vec![("framerate".to_string(), "30".to_string())]);
    }

    #[test]
    fn hw_without_device_uses_platform_default() {
        let args = Args::try_parse_from(["vidprobe", "probe", "clip.mp4", "--hw"]).unwrap();
        let Command::Probe(cmd) = args.command else {
            panic!("expected probe command");
        };
        assert_eq!(cmd.hw, Some(None));
        assert_eq!(
            cmd.decoder_config().hw_device,
            HwDevice::platform_default()
        );
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(Args::try_parse_from(["vidprobe", "probe", "a.mp4", "--hw", "nosuch"]).is_err());
        assert!(Args::try_parse_from(["vidprobe", "probe", "a.mp4", "-o", "novalue"]).is_err());
        assert!(Args::try_parse_from(["vidprobe"]).is_err());
    }
}

use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
pub struct FormatsCommand;

impl FormatsCommand {
    pub fn run(self) -> Result<()> {
        println!("Supported formats:");
        for name in ffmpeg_source::supported_formats() {
            println!("  - {}", name);
        }
        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct ProtocolsCommand;

impl ProtocolsCommand {
    pub fn run(self) -> Result<()> {
        println!("Supported protocols:");
        for name in ffmpeg_source::supported_protocols() {
            println!("  - {}", name);
        }
        Ok(())
    }
}

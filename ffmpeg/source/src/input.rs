/*!
    Parsing of input specifications.

    An input is either a bare location (file path, URL or device node) or
    a small command line in the style of the ffmpeg tool:

    ```text
    /dev/video0
    -f v4l2 -i /dev/video0
    -i /dev/video0 -f v4l2
    -f v4l2 /dev/video0
    ```
*/

use std::fmt;
use std::str::FromStr;

use ffmpeg_types::{Error, Result};

/**
    Location of a media input plus an optional forced container format.
*/
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputSpec {
    /// Path, URL or device passed to the container layer.
    pub location: String,
    /// Container format name forcing the demuxer, e.g. "v4l2".
    pub format: Option<String>,
}

impl InputSpec {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            format: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /**
        Parse a spec whose location may be omitted, as for byte-stream
        input where the location only serves as a probing hint.
    */
    pub(crate) fn parse_optional_location(s: &str) -> Result<Self> {
        Self::parse(s, false)
    }

    fn parse(s: &str, location_required: bool) -> Result<Self> {
        let tokens: Vec<&str> = s.split_whitespace().collect();

        if !tokens.iter().any(|token| is_directive(token)) {
            let location = s.trim();
            if location.is_empty() && location_required {
                return Err(Error::invalid_input("no input location given"));
            }
            return Ok(Self::new(location));
        }

        let mut format = None;
        let mut input: Option<Vec<&str>> = None;
        let mut bare = Vec::new();

        let mut tokens = tokens.into_iter().peekable();
        while let Some(token) = tokens.next() {
            match token {
                "-f" => {
                    let name = tokens
                        .next_if(|token| !is_directive(token))
                        .ok_or_else(|| Error::invalid_input("'-f' needs a format name"))?;
                    if format.replace(name.to_string()).is_some() {
                        return Err(Error::invalid_input("'-f' given more than once"));
                    }
                }
                "-i" => {
                    let mut parts = Vec::new();
                    while let Some(part) = tokens.next_if(|token| !is_directive(token)) {
                        parts.push(part);
                    }
                    if parts.is_empty() {
                        return Err(Error::invalid_input("'-i' needs an input location"));
                    }
                    if input.replace(parts).is_some() {
                        return Err(Error::invalid_input("'-i' given more than once"));
                    }
                }
                _ => bare.push(token),
            }
        }

        let location = match (input, bare.is_empty()) {
            (Some(parts), true) => parts.join(" "),
            (None, false) => bare.join(" "),
            (Some(_), false) => {
                return Err(Error::invalid_input(format!(
                    "unexpected '{}' next to '-i'",
                    bare.join(" ")
                )));
            }
            (None, true) if location_required => {
                return Err(Error::invalid_input("no input location given"));
            }
            (None, true) => String::new(),
        };

        Ok(Self { location, format })
    }
}

fn is_directive(token: &str) -> bool {
    matches!(token, "-f" | "-i")
}

impl FromStr for InputSpec {
    type Err = Error;

    /**
        Parse a bare location or an `-f <format>` / `-i <location>` line.

        `-f` takes exactly one token. `-i` takes every token up to the next
        directive, joined by single spaces. Tokens outside of any directive
        form the location when `-i` is absent.
    */
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, true)
    }
}

impl fmt::Display for InputSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.format {
            Some(format) => write!(f, "-f {format} -i {}", self.location),
            None => f.write_str(&self.location),
        }
    }
}

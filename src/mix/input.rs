//! Mix inputs
//!
//! Raw, still-encoded audio handed to the mixer together with the role it
//! plays on the timeline. Inputs are borrowed for one mix and never
//! retained.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MixError, Result};

/// Position of an input on the podcast timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Optional clip played before the main audio, faded out at its end
    Intro,
    /// The spoken podcast itself, always present
    Main,
    /// Optional clip played after the main audio, faded in at its start
    Outro,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Intro => write!(f, "intro"),
            Role::Main => write!(f, "main"),
            Role::Outro => write!(f, "outro"),
        }
    }
}

/// Encoded audio bytes tagged with their timeline role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAudioInput<'a> {
    pub role: Role,
    pub bytes: Cow<'a, [u8]>,
}

impl<'a> RawAudioInput<'a> {
    /// Wrap borrowed bytes
    pub fn new(role: Role, bytes: &'a [u8]) -> Self {
        Self {
            role,
            bytes: Cow::Borrowed(bytes),
        }
    }

    pub fn intro(bytes: &'a [u8]) -> Self {
        Self::new(Role::Intro, bytes)
    }

    pub fn main(bytes: &'a [u8]) -> Self {
        Self::new(Role::Main, bytes)
    }

    pub fn outro(bytes: &'a [u8]) -> Self {
        Self::new(Role::Outro, bytes)
    }

    /// Join a sequence of byte chunks into one owned input
    ///
    /// Speech synthesis returns one compressed stream per spoken line;
    /// back-to-back MPEG frames decode as a single continuous stream.
    pub fn concat_chunks<I, C>(role: Role, chunks: I) -> RawAudioInput<'static>
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        let mut bytes = Vec::new();
        for chunk in chunks {
            bytes.extend_from_slice(chunk.as_ref());
        }

        RawAudioInput {
            role,
            bytes: Cow::Owned(bytes),
        }
    }

    /// The encoded payload
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Intro / main / outro bundle
///
/// Convenience for callers holding the three clips separately; yields the
/// ordered input list the mixer expects.
#[derive(Debug, Clone, Copy)]
pub struct MixInputs<'a> {
    pub intro: Option<&'a [u8]>,
    pub main: &'a [u8],
    pub outro: Option<&'a [u8]>,
}

impl<'a> MixInputs<'a> {
    /// Main audio only
    pub fn main_only(main: &'a [u8]) -> Self {
        Self {
            intro: None,
            main,
            outro: None,
        }
    }

    pub fn with_intro(mut self, intro: &'a [u8]) -> Self {
        self.intro = Some(intro);
        self
    }

    pub fn with_outro(mut self, outro: &'a [u8]) -> Self {
        self.outro = Some(outro);
        self
    }

    /// Inputs in timeline order: [intro] main [outro]
    pub fn to_inputs(&self) -> Vec<RawAudioInput<'a>> {
        let mut inputs = Vec::with_capacity(3);
        if let Some(intro) = self.intro {
            inputs.push(RawAudioInput::intro(intro));
        }
        inputs.push(RawAudioInput::main(self.main));
        if let Some(outro) = self.outro {
            inputs.push(RawAudioInput::outro(outro));
        }
        inputs
    }
}

/// Check the role layout of an ordered input list
///
/// Valid layouts are `[intro] main [outro]`: exactly one main, at most one
/// intro placed first, at most one outro placed last.
pub fn validate_inputs(inputs: &[RawAudioInput<'_>]) -> Result<()> {
    if inputs.is_empty() {
        return Err(MixError::EmptyTimeline);
    }

    let count = |role: Role| inputs.iter().filter(|i| i.role == role).count();

    match count(Role::Main) {
        1 => {}
        0 => {
            return Err(MixError::InvalidInputs {
                reason: "a main input is required".to_string(),
            })
        }
        n => {
            return Err(MixError::InvalidInputs {
                reason: format!("exactly one main input allowed, got {}", n),
            })
        }
    }

    for role in [Role::Intro, Role::Outro] {
        let n = count(role);
        if n > 1 {
            return Err(MixError::InvalidInputs {
                reason: format!("at most one {} input allowed, got {}", role, n),
            });
        }
    }

    // Role ordering is intro < main < outro
    if let Some(pair) = inputs.windows(2).find(|w| w[0].role >= w[1].role) {
        return Err(MixError::InvalidInputs {
            reason: format!("{} input cannot precede {} input", pair[0].role, pair[1].role),
        });
    }

    Ok(())
}

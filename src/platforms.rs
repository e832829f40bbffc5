//! Platform table and command-line platform resolution
//!
//! The table maps friendly platform names to fully-qualified board names
//! (FQBNs) or to groups of other platform names. It is built once at startup
//! from the built-in entries plus an optional platforms file, and is read-only
//! afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::Result;

use crate::error::SketchCiError;

/// Board-support package indexes passed to every core command
pub const BSP_URLS: &[&str] = &[
    "https://raw.githubusercontent.com/RAKWireless/RAKwireless-Arduino-BSP-Index/main/package_rakwireless_index.json",
    "https://adafruit.github.io/arduino-board-index/package_adafruit_index.json",
    "http://arduino.esp8266.com/stable/package_esp8266com_index.json",
    "https://dl.espressif.com/dl/package_esp32_index.json",
    "https://sandeepmistry.github.io/arduino-nRF5/package_nRF5_boards_index.json",
    "https://raw.githubusercontent.com/RAKWireless/RAKwireless-Arduino-BSP-Index/main/package_rakwireless.com_rui_index.json",
];

/// Built-in table entries, in declaration order
const BUILTIN_PLATFORMS: &[(&str, BuiltinEntry)] = &[
    // classic Arduino AVR
    ("uno", BuiltinEntry::Board("arduino:avr:uno")),
    ("leonardo", BuiltinEntry::Board("arduino:avr:leonardo")),
    ("mega2560", BuiltinEntry::Board("arduino:avr:mega:cpu=atmega2560")),
    // Arduino SAMD
    ("zero", BuiltinEntry::Board("arduino:samd:arduino_zero_native")),
    ("cpx", BuiltinEntry::Board("arduino:samd:adafruit_circuitplayground_m0")),
    // Espressif
    ("esp8266", BuiltinEntry::Board("esp8266:esp8266:huzzah:eesz=4M3M,xtal=80")),
    ("esp32", BuiltinEntry::Board("esp32:esp32:featheresp32:FlashFreq=80")),
    // RAKwireless
    (
        "rak4631",
        BuiltinEntry::Board("rakwireless:nrf52:WisCoreRAK4631Board:softdevice=s140v6,debug=l0"),
    ),
    (
        "rak4631-rui",
        BuiltinEntry::Board("rak_rui:nrf52:WisCoreRAK4631Board:softdevice=s140v6,debug=l0"),
    ),
    (
        "rak3172-evaluation-rui",
        BuiltinEntry::Board("rak_rui:stm32:WisDuoRAK3172EvaluationBoard,debug=l0"),
    ),
    ("rak3172-T-rui", BuiltinEntry::Board("rak_rui:stm32:WisDuoRAK3172TBoard,debug=l0")),
    ("rak11200", BuiltinEntry::Board("rakwireless:esp32:WisCore_RAK11200_Board")),
    ("rak11300", BuiltinEntry::Board("rakwireless:mbed_rp2040:WisCoreRAK11300Board")),
    // groupings
    ("rak_platforms", BuiltinEntry::Group(&["rak4631", "rak11200", "rak11300"])),
    ("rak_platforms-test", BuiltinEntry::Group(&["rak4631", "rak11200", "rak11300"])),
    (
        "rak_platforms_rui-test",
        BuiltinEntry::Group(&["rak4631-rui", "rak3172-evaluation-rui", "rak3172-T-rui"]),
    ),
];

enum BuiltinEntry {
    Board(&'static str),
    Group(&'static [&'static str]),
}

/// Fully-qualified board name: `vendor:architecture:board[:options]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fqbn {
    pub vendor: String,
    pub architecture: String,
    pub board: String,
    pub options: Option<String>,
}

impl Fqbn {
    /// The `vendor:architecture` core that provides this board
    pub fn core(&self) -> String {
        format!("{}:{}", self.vendor, self.architecture)
    }
}

impl FromStr for Fqbn {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.trim().splitn(4, ':');
        let mut segment = |what: &str| -> Result<String> {
            match parts.next() {
                Some(p) if !p.is_empty() => Ok(p.to_string()),
                _ => anyhow::bail!(
                    "Invalid board identifier '{}': missing {} (expected vendor:arch:board[:options])",
                    s,
                    what
                ),
            }
        };

        let vendor = segment("vendor")?;
        let architecture = segment("architecture")?;
        let board = segment("board")?;
        let options = parts.next().filter(|o| !o.is_empty()).map(str::to_string);

        Ok(Self {
            vendor,
            architecture,
            board,
            options,
        })
    }
}

impl fmt::Display for Fqbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.vendor, self.architecture, self.board)?;
        if let Some(ref options) = self.options {
            write!(f, ":{}", options)?;
        }
        Ok(())
    }
}

/// A single table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEntry {
    /// One board
    Board(Fqbn),
    /// Names of other entries, expanded one level during resolution
    Group(Vec<String>),
}

/// A platform selected for this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlatform {
    /// Table key the board was found under
    pub key: String,
    /// Board to compile for
    pub fqbn: Fqbn,
}

/// Mapping from platform name to board or group
#[derive(Debug, Clone, Default)]
pub struct PlatformTable {
    entries: BTreeMap<String, PlatformEntry>,
}

impl PlatformTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the built-in boards and groups
    ///
    /// Every built-in board identifier parses; the table tests check each one.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for (key, entry) in BUILTIN_PLATFORMS {
            let entry = match entry {
                BuiltinEntry::Board(fqbn) => match fqbn.parse() {
                    Ok(fqbn) => PlatformEntry::Board(fqbn),
                    Err(_) => continue,
                },
                BuiltinEntry::Group(members) => {
                    PlatformEntry::Group(members.iter().map(|m| m.to_string()).collect())
                }
            };
            table.insert(*key, entry);
        }
        table
    }

    /// Add or replace an entry
    pub fn insert(&mut self, key: impl Into<String>, entry: PlatformEntry) {
        self.entries.insert(key.into(), entry);
    }

    /// Look up an entry by name
    pub fn get(&self, key: &str) -> Option<&PlatformEntry> {
        self.entries.get(key)
    }

    /// Iterate entries sorted by name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PlatformEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve command-line tokens into the boards to test
    ///
    /// Output order follows the input; duplicates are preserved. Any unknown
    /// token fails the whole resolution.
    pub fn resolve<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<ResolvedPlatform>, SketchCiError> {
        let mut resolved = Vec::new();

        for token in tokens {
            let token = token.as_ref();
            match self.get(token) {
                Some(PlatformEntry::Board(fqbn)) => resolved.push(ResolvedPlatform {
                    key: token.to_string(),
                    fqbn: fqbn.clone(),
                }),
                Some(PlatformEntry::Group(members)) => {
                    for member in members {
                        resolved.push(self.resolve_member(token, member)?);
                    }
                }
                None => return Err(SketchCiError::unknown_platform(token, &self.board_names(5))),
            }
        }

        Ok(resolved)
    }

    fn resolve_member(&self, group: &str, member: &str) -> Result<ResolvedPlatform, SketchCiError> {
        match self.get(member) {
            Some(PlatformEntry::Board(fqbn)) => Ok(ResolvedPlatform {
                key: member.to_string(),
                fqbn: fqbn.clone(),
            }),
            Some(PlatformEntry::Group(_)) => Err(SketchCiError::config_error(format!(
                "Group '{}' contains group '{}'; groups may only list boards",
                group, member
            ))),
            None => Err(SketchCiError::config_error(format!(
                "Group '{}' lists unknown platform '{}'",
                group, member
            ))),
        }
    }

    fn board_names(&self, limit: usize) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, e)| matches!(e, PlatformEntry::Board(_)))
            .map(|(k, _)| k.as_str())
            .take(limit)
            .collect()
    }
}

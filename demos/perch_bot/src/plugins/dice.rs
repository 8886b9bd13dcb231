//! Dice rolling.
//!
//! Any message containing `NdM` (or just `dM`) gets an answer with the
//! individual rolls, e.g. `belak: 2d6: 3, 5`.

use std::sync::Arc;

use perch::framework::{Bot, BotError, HelpInfo, MentionMux, PluginError, PluginRegistry};
use rand::Rng;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

/// Plugin name.
pub const NAME: &str = "dice";

const DICE_PATTERN: &str = r"(?:^|\b)(\d*)d(\d+)\b";

/// The optional `[dice]` configuration section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiceConfig {
    /// Most dice a single message may request, across all groups.
    pub max_dice: u64,
    /// Largest die size.
    pub max_sides: u64,
}

impl Default for DiceConfig {
    fn default() -> Self {
        Self {
            max_dice: 100,
            max_sides: 100,
        }
    }
}

/// A request the roller refuses; the message is sent back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RollError {
    #[error("You cannot request more than {0} dice")]
    TooManyDice(u64),
    #[error("You cannot request dice larger than {0}")]
    TooLarge(u64),
    #[error("You cannot request dice smaller than 1")]
    TooSmall,
}

pub struct Dice {
    pattern: Regex,
    config: DiceConfig,
}

impl Dice {
    pub fn new(config: DiceConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(DICE_PATTERN)?,
            config,
        })
    }

    /// Rolls every dice group in `text`.
    ///
    /// Returns `Ok(None)` when the text mentions no dice.
    pub fn roll<R: Rng>(&self, text: &str, rng: &mut R) -> Result<Option<String>, RollError> {
        let mut rolls = Vec::new();
        let mut total: u64 = 0;

        for caps in self.pattern.captures_iter(text) {
            let count = match &caps[1] {
                "" => 1,
                digits => digits.parse::<u64>().unwrap_or(u64::MAX).max(1),
            };
            total = total.saturating_add(count);
            if total > self.config.max_dice {
                return Err(RollError::TooManyDice(self.config.max_dice));
            }

            let sides = caps[2].parse::<u64>().unwrap_or(u64::MAX);
            if sides > self.config.max_sides {
                return Err(RollError::TooLarge(self.config.max_sides));
            }
            if sides < 1 {
                return Err(RollError::TooSmall);
            }

            let dice: Vec<String> = (0..count)
                .map(|_| rng.random_range(1..=sides).to_string())
                .collect();
            rolls.push(format!("{count}d{sides}: {}", dice.join(", ")));
        }

        Ok((!rolls.is_empty()).then(|| rolls.join(" ")))
    }
}

pub fn register(registry: &PluginRegistry) -> Result<(), PluginError> {
    registry.register(NAME, |(bot, mentions): (Arc<Bot>, Arc<MentionMux>)| {
        let config = match bot.config::<DiceConfig>(NAME) {
            Ok(config) => config,
            Err(BotError::MissingSection { .. }) => DiceConfig::default(),
            Err(e) => return Err(anyhow::Error::from(e)),
        };
        let dice = Dice::new(config)?;

        mentions.event(
            move |bot, event| {
                let text = match dice.roll(event.trailing(), &mut rand::rng()) {
                    Ok(Some(rolls)) => rolls,
                    Ok(None) => return Ok(()),
                    Err(refused) => refused.to_string(),
                };
                bot.mention_reply(event, text)?;
                Ok(())
            },
            Some(HelpInfo::new("NdM", "Rolls dice written anywhere in a message")),
        );
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::test_support::Host;
    use perch::framework::ConfigSections;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn roll(text: &str) -> Result<Option<String>, RollError> {
        let dice = Dice::new(DiceConfig::default()).unwrap();
        dice.roll(text, &mut StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_roll_groups() {
        assert_eq!(roll("roll 3d1 please").unwrap().unwrap(), "3d1: 1, 1, 1");
        assert_eq!(roll("d1").unwrap().unwrap(), "1d1: 1");
        assert_eq!(roll("0d1 and 2d1").unwrap().unwrap(), "1d1: 1 2d1: 1, 1");
    }

    #[test]
    fn test_rolls_stay_in_range() {
        let dice = Dice::new(DiceConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let rolls = dice.roll("100d6", &mut rng).unwrap().unwrap();
        let values = rolls.trim_start_matches("100d6: ").split(", ");
        assert_eq!(values.clone().count(), 100);
        assert!(values.map(|v| v.parse::<u64>().unwrap()).all(|v| (1..=6).contains(&v)));
    }

    #[test]
    fn test_no_dice() {
        assert_eq!(roll("nothing to see here"), Ok(None));
        assert_eq!(roll("add1"), Ok(None));
    }

    #[test]
    fn test_refusals() {
        assert_eq!(roll("101d6"), Err(RollError::TooManyDice(100)));
        assert_eq!(roll("60d6 41d6"), Err(RollError::TooManyDice(100)));
        assert_eq!(roll("1d101"), Err(RollError::TooLarge(100)));
        assert_eq!(roll("2d0"), Err(RollError::TooSmall));
        assert_eq!(
            roll("99999999999999999999999d6"),
            Err(RollError::TooManyDice(100))
        );
    }

    #[test]
    fn test_plugin_replies_to_mentions() {
        let mut host = Host::new(ConfigSections::new());
        register(&host.registry).unwrap();
        host.registry.resolve(NAME).unwrap();

        host.feed(":belak!b@host PRIVMSG #perch :roll 2d1 for me");
        assert_eq!(host.sent(), vec!["PRIVMSG #perch :belak: 2d1: 1, 1"]);

        host.feed(":belak!b@host PRIVMSG #perch :hello");
        assert!(host.sent().is_empty());
    }

    #[test]
    fn test_plugin_reads_config_section() {
        let mut sections = ConfigSections::new();
        sections.insert(NAME.to_string(), serde_json::json!({ "max_dice": 2 }));
        let mut host = Host::new(sections);
        register(&host.registry).unwrap();
        host.registry.resolve(NAME).unwrap();

        host.feed(":belak!b@host PRIVMSG bot :3d1");
        assert_eq!(
            host.sent(),
            vec!["PRIVMSG belak :You cannot request more than 2 dice"]
        );
    }

    #[test]
    fn test_malformed_config_fails_wiring() {
        let mut sections = ConfigSections::new();
        sections.insert(NAME.to_string(), serde_json::json!({ "max_dice": "lots" }));
        let host = Host::new(sections);
        register(&host.registry).unwrap();

        assert!(matches!(
            host.registry.resolve(NAME),
            Err(PluginError::Factory { .. })
        ));
    }
}

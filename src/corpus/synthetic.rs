//! Seeded template-based corpus generator.
//!
//! Each example is one base phrase from its profile's bank, optionally
//! decorated with a conversational prefix and suffix. Generation is fully
//! determined by the seed.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::ml::types::{LabeledExample, RiskProfile};

const CONSERVATIVE_PHRASES: [&str; 20] = [
    "I want to protect my savings and avoid any losses. Safety is my priority.",
    "I'm nearing retirement and need stable income with minimal risk.",
    "I prefer low-risk investments that preserve my capital.",
    "I'm saving for a house deposit in the next year and can't afford to lose money.",
    "I want guaranteed returns even if they're small. I hate volatility.",
    "My emergency fund needs to be safe and accessible.",
    "I'm risk-averse and prefer bonds over stocks any day.",
    "Capital preservation is more important to me than growth.",
    "I want steady, predictable returns without any surprises.",
    "I'm close to retiring so I need stable investments that won't fluctuate.",
    "I don't want to take any chances with my savings.",
    "Low returns are fine as long as my money is safe.",
    "I'm saving for something in the next 2 years so I need certainty.",
    "I get anxious when markets are volatile so I stick to safe options.",
    "Government bonds and savings accounts suit my needs perfectly.",
    "I'm over 60 and need to protect what I've earned.",
    "Stability and security are my top priorities for investments.",
    "I would rather miss out on gains than risk losing my capital.",
    "Fixed income investments are what I'm looking for.",
    "I want something as safe as a bank account but maybe slightly better returns.",
];

const BALANCED_PHRASES: [&str; 20] = [
    "I want a mix of growth and stability for my long-term savings.",
    "I'm comfortable with some ups and downs if it means better returns overall.",
    "I'm saving for my children's university fees in about 10 years.",
    "I can handle moderate risk if the long-term outlook is positive.",
    "A balanced portfolio of stocks and bonds would suit me well.",
    "I want steady growth over time but not too much volatility.",
    "I'm in my 40s and want to grow my pension without going too aggressive.",
    "Some risk is acceptable but I don't want wild swings in my portfolio.",
    "I'd like a diversified mix that balances growth with security.",
    "I'm looking for consistent returns over a 5-10 year horizon.",
    "Middle of the road investments work best for my situation.",
    "I want reasonable growth potential while managing downside risk.",
    "Not too conservative, not too aggressive - somewhere in between.",
    "I can tolerate short-term losses for medium-term gains.",
    "A 50/50 split between stocks and bonds sounds about right.",
    "I'm building a nest egg and have 10-15 years until I need it.",
    "Moderate risk is fine as I have time to recover from any dips.",
    "I want diversification across different asset classes.",
    "Growth is important but so is some level of stability.",
    "I'm looking for the sweet spot between risk and reward.",
];

const AGGRESSIVE_PHRASES: [&str; 20] = [
    "I want maximum growth and I'm happy to ride out any volatility.",
    "I'm young and have decades before retirement, so I can take big risks.",
    "I want high-growth stocks and emerging markets exposure.",
    "I'm excited about cryptocurrency and tech startups.",
    "I don't mind if my portfolio goes down 30% as long as the long-term returns are high.",
    "I want aggressive growth even if it means significant short-term losses.",
    "This is play money I can afford to lose, so go for maximum returns.",
    "I'm in my 20s with a high income and want to grow wealth rapidly.",
    "All-in on equities, no bonds needed. I want growth.",
    "I'm comfortable with high volatility for potentially high rewards.",
    "I want exposure to disruptive technologies and growth stocks.",
    "Risk doesn't scare me, I see it as opportunity.",
    "My time horizon is 30+ years so I can handle any crashes.",
    "I'm looking for aggressive capital appreciation strategies.",
    "Bitcoin, tech stocks, and venture capital interest me.",
    "I want the highest possible returns and accept the associated risks.",
    "I have a high risk tolerance and want my money working hard.",
    "Growth-focused investments are what I'm after.",
    "I'm speculating with money I can afford to lose completely.",
    "Maximum risk, maximum reward - that's my approach.",
];

const PREFIXES: [&str; 10] = [
    "",
    "Honestly, ",
    "To be frank, ",
    "Looking at my situation, ",
    "At this stage in life, ",
    "Given my circumstances, ",
    "For my financial goals, ",
    "When it comes to investing, ",
    "My philosophy is that ",
    "I believe ",
];

// The empty suffix appears twice so that undecorated endings are more common.
const SUFFIXES: [&str; 9] = [
    "",
    " What do you recommend?",
    " That's my view on things.",
    " I hope that makes sense.",
    " Does that help?",
    " That's how I feel about it.",
    " I'd appreciate your advice.",
    " Let me know your thoughts.",
    "",
];

/// Default number of generated rows.
pub const DEFAULT_SAMPLES: usize = 500;

/// Default generator seed.
pub const DEFAULT_SEED: u64 = 42;

/// Generator of balanced, labeled statements.
#[derive(Debug, Clone)]
pub struct SyntheticCorpus {
    seed: u64,
}

impl Default for SyntheticCorpus {
    fn default() -> Self {
        SyntheticCorpus { seed: DEFAULT_SEED }
    }
}

impl SyntheticCorpus {
    /// Create a generator with the given seed.
    pub fn new(seed: u64) -> Self {
        SyntheticCorpus { seed }
    }

    /// The generator seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Base phrases for one profile.
    pub fn phrases(profile: RiskProfile) -> &'static [&'static str] {
        match profile {
            RiskProfile::Conservative => &CONSERVATIVE_PHRASES,
            RiskProfile::Balanced => &BALANCED_PHRASES,
            RiskProfile::Aggressive => &AGGRESSIVE_PHRASES,
        }
    }

    /// Generate `total` shuffled examples.
    ///
    /// Every profile receives `total / 3` examples; the remainder goes to the
    /// profiles in canonical order, one each.
    pub fn generate(&self, total: usize) -> Vec<LabeledExample> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let per_class = total / RiskProfile::COUNT;
        let remainder = total % RiskProfile::COUNT;

        let mut examples = Vec::with_capacity(total);
        for _ in 0..per_class {
            for profile in RiskProfile::ALL {
                examples.push(sample(&mut rng, profile));
            }
        }
        for profile in RiskProfile::ALL.into_iter().take(remainder) {
            examples.push(sample(&mut rng, profile));
        }

        examples.shuffle(&mut rng);
        log::debug!("generated {} synthetic examples (seed {})", examples.len(), self.seed);
        examples
    }
}

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items[rng.random_range(0..items.len())]
}

fn sample(rng: &mut StdRng, profile: RiskProfile) -> LabeledExample {
    let base = pick(rng, SyntheticCorpus::phrases(profile));
    let prefix = pick(rng, &PREFIXES);
    let suffix = pick(rng, &SUFFIXES);
    let text = format!("{prefix}{base}{suffix}");
    LabeledExample::new(text.trim(), profile)
}

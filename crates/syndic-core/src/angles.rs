//! Narrative angles and their rotation.
//!
//! Angles are fixed, ordered lists per platform family. Nothing records which
//! angle was used: the index is `count mod len`, where `count` comes from the
//! append-only logs, so the next angle always differs from the previous one
//! when a list has more than one entry.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Angle {
    pub id: &'static str,
    pub label: &'static str,
    pub instruction: &'static str,
}

/// Long-form English articles (Dev.to, Hashnode).
pub static ARTICLE_ANGLES: &[Angle] = &[
    Angle {
        id: "solve-their-problem",
        label: "Solving a Real Problem",
        instruction: "Write about a problem that the target audience actually faces. Explain it from their perspective, walk through possible solutions, and share what worked for you. Your tool may appear as one of the solutions, but the article should help readers even if they never use it.",
    },
    Angle {
        id: "what-i-learned",
        label: "What I Learned",
        instruction: "Share genuine lessons from your experience in the target audience's domain. What surprised you? What did you get wrong? Write as a peer sharing hard-won knowledge, not as someone promoting a product.",
    },
    Angle {
        id: "honest-comparison",
        label: "Honest Comparison",
        instruction: "Compare different approaches to a problem the target audience cares about. Be objective and include pros and cons of each approach including your own. Readers should be able to make their own informed decision.",
    },
    Angle {
        id: "beginner-guide",
        label: "Getting Started Guide",
        instruction: "Write a guide for someone new to the target audience's domain. What do they need to know first? What mistakes should they avoid? Your tool can appear as something you use, but the guide should be valuable regardless.",
    },
    Angle {
        id: "workflow-share",
        label: "My Workflow",
        instruction: "Share your actual workflow in the target audience's domain. Be specific about what tools and methods you use and why. Your app naturally appears as part of your workflow, not as a recommendation.",
    },
];

/// Japanese technical tutorials (Qiita, Zenn).
pub static TUTORIAL_ANGLES: &[Angle] = &[
    Angle {
        id: "implementation-notes",
        label: "Implementation Notes",
        instruction: "Walk through how one concrete feature was implemented. Show the real code, explain the design decisions, and point out the parts that were harder than expected.",
    },
    Angle {
        id: "problem-and-fix",
        label: "Problem and Fix",
        instruction: "Start from a specific technical problem readers are likely to hit, reproduce it, and show the fix step by step with working code.",
    },
    Angle {
        id: "measured-results",
        label: "Measured Results",
        instruction: "Center the article on numbers you actually measured. Describe the setup, show the code used to measure, and discuss what the results do and do not show.",
    },
    Angle {
        id: "design-tradeoffs",
        label: "Design Trade-offs",
        instruction: "Compare two or three ways to structure the same feature. Show code for each and explain when each one is the right choice.",
    },
];

/// Short posts (X, Bluesky, Mastodon).
pub static SHORT_POST_ANGLES: &[Angle] = &[
    Angle {
        id: "user-pain",
        label: "User Pain",
        instruction: "Open with a frustration the target user will recognise, then mention in one line how you deal with it now.",
    },
    Angle {
        id: "behind-the-scenes",
        label: "Behind the Scenes",
        instruction: "Share one concrete, specific moment from building or using the project. No feature lists.",
    },
    Angle {
        id: "small-win",
        label: "Small Win",
        instruction: "Share one real result or observation from the source material, stated plainly.",
    },
    Angle {
        id: "question-to-peers",
        label: "Question to Peers",
        instruction: "Describe a situation briefly and end with a genuine question to people in the same position.",
    },
];

/// Which publication count drives the angle index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleScope {
    /// Posts of this entity on this platform (its posted log).
    #[default]
    PerPlatform,
    /// All publication-history entries of this entity.
    Global,
}

/// `angles[count mod len]`; `None` for platforms without angles.
pub fn select_angle(angles: &'static [Angle], count: usize) -> Option<&'static Angle> {
    if angles.is_empty() {
        return None;
    }
    angles.get(count % angles.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_ids_are_unique_per_list() {
        for list in [ARTICLE_ANGLES, TUTORIAL_ANGLES, SHORT_POST_ANGLES] {
            let mut ids: Vec<_> = list.iter().map(|a| a.id).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), list.len());
        }
    }

    #[test]
    fn empty_list_selects_nothing() {
        assert!(select_angle(&[], 3).is_none());
    }
}

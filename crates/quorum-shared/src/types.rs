use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{ANSWER_VOTE_WEIGHT, QUESTION_VOTE_WEIGHT};

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identity of a signed-up user. Doubles as the profile document key.
    UserId
);
entity_id!(QuestionId);
entity_id!(AnswerId);
entity_id!(ReplyId);
entity_id!(NotificationId);

/// The two kinds of votable content. Replies carry no votes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VoteTarget {
    Question,
    Answer,
}

impl VoteTarget {
    /// Reputation points the content author gains per net upvote.
    pub fn weight(self) -> i64 {
        match self {
            VoteTarget::Question => QUESTION_VOTE_WEIGHT,
            VoteTarget::Answer => ANSWER_VOTE_WEIGHT,
        }
    }

    /// Table name in the store. Used for log fields, never interpolated
    /// into SQL from user input.
    pub fn as_str(self) -> &'static str {
        match self {
            VoteTarget::Question => "questions",
            VoteTarget::Answer => "answers",
        }
    }
}

/// A vote request as cast by a user. The absence of a vote is represented
/// by the absence of a row, never by a zero direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn value(self) -> i64 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

impl TryFrom<i64> for VoteDirection {
    type Error = i64;

    fn try_from(v: i64) -> Result<Self, i64> {
        match v {
            1 => Ok(VoteDirection::Up),
            -1 => Ok(VoteDirection::Down),
            other => Err(other),
        }
    }
}

/// Sort order for the question list page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuestionSort {
    #[default]
    Newest,
    Votes,
    Answers,
}

impl std::str::FromStr for QuestionSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(QuestionSort::Newest),
            "votes" => Ok(QuestionSort::Votes),
            "answers" => Ok(QuestionSort::Answers),
            other => Err(format!("unknown sort: {other}")),
        }
    }
}

/// Why a notification was produced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// The recipient was @-mentioned in a question or answer body.
    Mention,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Mention => "mention",
        }
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mention" => Ok(NotificationKind::Mention),
            other => Err(format!("unknown notification kind: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_direction_round_trip() {
        assert_eq!(VoteDirection::try_from(1), Ok(VoteDirection::Up));
        assert_eq!(VoteDirection::try_from(-1), Ok(VoteDirection::Down));
        assert_eq!(VoteDirection::try_from(0), Err(0));
        assert_eq!(VoteDirection::Up.value(), 1);
        assert_eq!(VoteDirection::Down.value(), -1);
    }

    #[test]
    fn target_weights() {
        assert_eq!(VoteTarget::Question.weight(), 5);
        assert_eq!(VoteTarget::Answer.weight(), 10);
    }

    #[test]
    fn sort_from_str() {
        assert_eq!("votes".parse::<QuestionSort>(), Ok(QuestionSort::Votes));
        assert!("hot".parse::<QuestionSort>().is_err());
    }
}

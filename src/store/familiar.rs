use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of flight lanes in the forest view.
pub const LANE_COUNT: u8 = 5;

/// A user-submitted magical creature.
///
/// Field names match the persisted JSON document. `lane` and `speed` are
/// optional because older documents may omit them; the forest view fills
/// them in on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Familiar {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub original_image: String,
    #[serde(default)]
    pub generated_image: String,
    #[serde(default)]
    pub animal_name: String,
    #[serde(default)]
    pub animal_species: String,
    #[serde(default)]
    pub original_item_name: String,
    #[serde(default)]
    pub magic_power: i64,
    #[serde(default)]
    pub created_time: i64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub dislikes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lane: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default)]
    pub is_main: bool,
}

/// Fields supplied when a familiar is first saved.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFamiliar {
    #[serde(default)]
    pub original_image: String,
    #[serde(default)]
    pub generated_image: String,
    #[serde(default = "unknown")]
    pub animal_name: String,
    #[serde(default = "unknown")]
    pub animal_species: String,
    #[serde(default = "unknown")]
    pub original_item_name: String,
}

fn unknown() -> String {
    "Unknown".to_owned()
}

impl Familiar {
    /// Builds a fresh record: zero counters, not main, random lane in
    /// `0..5` and speed in `[10, 30)`.
    pub fn summon<R: Rng + ?Sized>(
        new: NewFamiliar,
        id: String,
        owner_id: &str,
        created_time: i64,
        rng: &mut R,
    ) -> Self {
        Familiar {
            id,
            user_id: owner_id.to_owned(),
            original_image: new.original_image,
            generated_image: new.generated_image,
            animal_name: new.animal_name,
            animal_species: new.animal_species,
            original_item_name: new.original_item_name,
            magic_power: 0,
            created_time,
            likes: 0,
            dislikes: 0,
            lane: Some(rng.gen_range(0..LANE_COUNT)),
            speed: Some(10.0 + rng.gen::<f64>() * 20.0),
            is_main: false,
        }
    }

    /// Applies a vote and recomputes `magic_power = likes - dislikes`.
    pub fn apply_vote(&mut self, vote: Vote) -> Tally {
        match vote {
            Vote::Like => self.likes += 1,
            Vote::Dislike => self.dislikes += 1,
        }
        self.magic_power = self.likes as i64 - self.dislikes as i64;
        self.tally()
    }

    pub fn tally(&self) -> Tally {
        Tally {
            likes: self.likes,
            dislikes: self.dislikes,
            magic_power: self.magic_power,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Like,
    Dislike,
}

impl Vote {
    /// Positive values like, everything else dislikes.
    pub fn from_value(value: i64) -> Self {
        if value > 0 { Vote::Like } else { Vote::Dislike }
    }
}

/// Engagement counters after a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub likes: u64,
    pub dislikes: u64,
    pub magic_power: i64,
}

/// Shallow update: every `Some` field overwrites, `None` fields are kept.
/// The id is not patchable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FamiliarPatch {
    pub user_id: Option<String>,
    pub original_image: Option<String>,
    pub generated_image: Option<String>,
    pub animal_name: Option<String>,
    pub animal_species: Option<String>,
    pub original_item_name: Option<String>,
    pub magic_power: Option<i64>,
    pub created_time: Option<i64>,
    pub likes: Option<u64>,
    pub dislikes: Option<u64>,
    pub lane: Option<u8>,
    pub speed: Option<f64>,
    pub is_main: Option<bool>,
}

impl FamiliarPatch {
    pub fn apply(self, target: &mut Familiar) {
        macro_rules! merge {
            ($($field:ident),*) => {
                $( if let Some(v) = self.$field { target.$field = v; } )*
            };
        }
        merge!(
            user_id,
            original_image,
            generated_image,
            animal_name,
            animal_species,
            original_item_name,
            magic_power,
            created_time,
            likes,
            dislikes,
            is_main
        );
        if let Some(lane) = self.lane {
            target.lane = Some(lane);
        }
        if let Some(speed) = self.speed {
            target.speed = Some(speed);
        }
    }
}

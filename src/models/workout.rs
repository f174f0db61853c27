use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::{validate_exercise_name, ModelError};

/// ---------------------------------------------------------------------------
/// Workout Date
/// ---------------------------------------------------------------------------

/// Calendar date of a workout, always a zero-padded `YYYY-MM-DD`.
///
/// Ordering matches the lexicographic order of the padded string, which is what
/// every date-window rule in the analytics relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkoutDate(NaiveDate);

impl WorkoutDate {
  pub const FORMAT: &'static str = "%Y-%m-%d";

  pub fn new(date: NaiveDate) -> Self {
    Self(date)
  }

  pub fn date(&self) -> NaiveDate {
    self.0
  }
}

impl From<NaiveDate> for WorkoutDate {
  fn from(date: NaiveDate) -> Self {
    Self(date)
  }
}

impl FromStr for WorkoutDate {
  type Err = ModelError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let bytes = s.as_bytes();
    // chrono accepts "2024-1-5"; padding is checked by hand
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
      return Err(ModelError::InvalidDate(s.to_string()));
    }
    NaiveDate::parse_from_str(s, Self::FORMAT)
      .map(Self)
      .map_err(|_| ModelError::InvalidDate(s.to_string()))
  }
}

impl fmt::Display for WorkoutDate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.format(Self::FORMAT))
  }
}

impl Serialize for WorkoutDate {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for WorkoutDate {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}

/// ---------------------------------------------------------------------------
/// Sets
/// ---------------------------------------------------------------------------

/// One performed set. The variant decides which fields are meaningful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkoutSet {
  /// Load in kg and repetitions
  Weighted { weight: f64, reps: u32 },
  /// Repetitions only
  Bodyweight { reps: u32 },
  /// Duration in minutes, optional distance in km
  Cardio {
    duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    distance: Option<f64>,
  },
}

impl WorkoutSet {
  pub fn weighted(weight: f64, reps: u32) -> Self {
    Self::Weighted { weight, reps }
  }

  pub fn bodyweight(reps: u32) -> Self {
    Self::Bodyweight { reps }
  }

  pub fn cardio(duration: f64, distance: Option<f64>) -> Self {
    Self::Cardio { duration, distance }
  }

  /// Load in kg; 0 for bodyweight and cardio sets
  pub fn weight(&self) -> f64 {
    match self {
      Self::Weighted { weight, .. } => *weight,
      _ => 0.0,
    }
  }

  pub fn reps(&self) -> u32 {
    match self {
      Self::Weighted { reps, .. } | Self::Bodyweight { reps } => *reps,
      Self::Cardio { .. } => 0,
    }
  }

  pub fn duration(&self) -> f64 {
    match self {
      Self::Cardio { duration, .. } => *duration,
      _ => 0.0,
    }
  }

  pub fn distance(&self) -> f64 {
    match self {
      Self::Cardio { distance, .. } => distance.unwrap_or(0.0),
      _ => 0.0,
    }
  }

  pub fn validate(&self) -> Result<(), ModelError> {
    let check = |field: &'static str, value: f64| {
      if value.is_finite() && value >= 0.0 {
        Ok(())
      } else {
        Err(ModelError::InvalidSet { field, value })
      }
    };

    match self {
      Self::Weighted { weight, .. } => check("weight", *weight),
      Self::Bodyweight { .. } => Ok(()),
      Self::Cardio { duration, distance } => {
        check("duration", *duration)?;
        distance.map_or(Ok(()), |d| check("distance", d))
      }
    }
  }
}

/// ---------------------------------------------------------------------------
/// Logged Exercises and Workout Logs
/// ---------------------------------------------------------------------------

/// An exercise as performed in one workout. `name` joins to `ExerciseMaster::name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseEntry {
  pub id: String,
  pub name: String,
  pub sets: Vec<WorkoutSet>,
}

impl ExerciseEntry {
  /// Create an entry with a fresh random id
  pub fn new(name: impl Into<String>, sets: Vec<WorkoutSet>) -> Self {
    Self {
      id: uuid::Uuid::new_v4().to_string(),
      name: name.into(),
      sets,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutLog {
  pub id: i64,
  pub date: WorkoutDate,
  pub exercises: Vec<ExerciseEntry>,
  pub memo: Option<String>,
  pub evaluation: Option<String>,
  /// Epoch millis
  pub evaluation_generated_at: Option<i64>,
  pub created_at: i64,
  pub updated_at: i64,
}

impl WorkoutLog {
  /// All entries for an exercise name, in log order
  pub fn entries_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ExerciseEntry> + 'a {
    self.exercises.iter().filter(move |ex| ex.name == name)
  }
}

/// For inserting new logs (without id, timestamps)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWorkoutLog {
  pub date: WorkoutDate,
  pub exercises: Vec<ExerciseEntry>,
  pub memo: Option<String>,
}

impl NewWorkoutLog {
  pub fn validate(&self) -> Result<(), ModelError> {
    for ex in &self.exercises {
      validate_exercise_name(&ex.name)?;
      for set in &ex.sets {
        set.validate()?;
      }
    }
    Ok(())
  }
}

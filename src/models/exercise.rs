use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{validate_exercise_name, ModelError};

/// ---------------------------------------------------------------------------
/// Muscle Groups
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuscleGroup {
  Chest,
  Back,
  Shoulder,
  Biceps,
  Triceps,
  Quadriceps,
  Hamstrings,
  Glutes,
  Abs,
}

impl MuscleGroup {
  /// Fixed report order
  pub const ALL: [MuscleGroup; 9] = [
    MuscleGroup::Chest,
    MuscleGroup::Back,
    MuscleGroup::Shoulder,
    MuscleGroup::Biceps,
    MuscleGroup::Triceps,
    MuscleGroup::Quadriceps,
    MuscleGroup::Hamstrings,
    MuscleGroup::Glutes,
    MuscleGroup::Abs,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      MuscleGroup::Chest => "chest",
      MuscleGroup::Back => "back",
      MuscleGroup::Shoulder => "shoulder",
      MuscleGroup::Biceps => "biceps",
      MuscleGroup::Triceps => "triceps",
      MuscleGroup::Quadriceps => "quadriceps",
      MuscleGroup::Hamstrings => "hamstrings",
      MuscleGroup::Glutes => "glutes",
      MuscleGroup::Abs => "abs",
    }
  }

  /// Display label used in advice and prompts
  pub fn label(&self) -> &'static str {
    match self {
      MuscleGroup::Chest => "胸",
      MuscleGroup::Back => "背中",
      MuscleGroup::Shoulder => "肩",
      MuscleGroup::Biceps => "二頭",
      MuscleGroup::Triceps => "三頭",
      MuscleGroup::Quadriceps => "四頭",
      MuscleGroup::Hamstrings => "ハム",
      MuscleGroup::Glutes => "臀部",
      MuscleGroup::Abs => "腹筋",
    }
  }
}

impl std::str::FromStr for MuscleGroup {
  type Err = ModelError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    MuscleGroup::ALL
      .into_iter()
      .find(|m| m.as_str() == s)
      .ok_or_else(|| ModelError::UnknownMuscle(s.to_string()))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetMuscle {
  pub muscle: MuscleGroup,
  pub is_main: bool,
}

impl TargetMuscle {
  pub const fn main(muscle: MuscleGroup) -> Self {
    Self { muscle, is_main: true }
  }

  pub const fn sub(muscle: MuscleGroup) -> Self {
    Self { muscle, is_main: false }
  }
}

/// ---------------------------------------------------------------------------
/// Exercise Kind
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
  #[default]
  Weighted,
  Bodyweight,
  Cardio,
}

impl ExerciseKind {
  /// Cardio wins over bodyweight when both flags are set
  pub fn from_flags(is_bodyweight: bool, is_cardio: bool) -> Self {
    if is_cardio {
      ExerciseKind::Cardio
    } else if is_bodyweight {
      ExerciseKind::Bodyweight
    } else {
      ExerciseKind::Weighted
    }
  }

  pub fn is_bodyweight(&self) -> bool {
    *self == ExerciseKind::Bodyweight
  }

  pub fn is_cardio(&self) -> bool {
    *self == ExerciseKind::Cardio
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      ExerciseKind::Weighted => "weighted",
      ExerciseKind::Bodyweight => "bodyweight",
      ExerciseKind::Cardio => "cardio",
    }
  }
}

impl std::str::FromStr for ExerciseKind {
  type Err = ModelError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "weighted" => Ok(Self::Weighted),
      "bodyweight" => Ok(Self::Bodyweight),
      "cardio" => Ok(Self::Cardio),
      _ => Err(ModelError::UnknownKind(s.to_string())),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Exercise Master
/// ---------------------------------------------------------------------------

/// Registered exercise definition. `name` is the join key for logged exercises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseMaster {
  pub id: i64,
  pub name: String,
  pub kind: ExerciseKind,
  pub target_muscles: Vec<TargetMuscle>,
  pub created_at: i64,
}

impl ExerciseMaster {
  pub fn is_bodyweight(&self) -> bool {
    self.kind.is_bodyweight()
  }

  pub fn is_cardio(&self) -> bool {
    self.kind.is_cardio()
  }
}

/// For inserting new masters (without id, created_at)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExerciseMaster {
  pub name: String,
  pub kind: ExerciseKind,
  pub target_muscles: Vec<TargetMuscle>,
}

impl NewExerciseMaster {
  pub fn validate(&self) -> Result<(), ModelError> {
    validate_exercise_name(&self.name)?;
    if self.kind.is_cardio() && !self.target_muscles.is_empty() {
      return Err(ModelError::CardioWithTargets(self.name.clone()));
    }
    let mut seen = HashSet::new();
    for target in &self.target_muscles {
      if !seen.insert(target.muscle) {
        return Err(ModelError::DuplicateMuscle(target.muscle.as_str()));
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_kind_from_flags_priority() {
    assert_eq!(ExerciseKind::from_flags(true, true), ExerciseKind::Cardio);
    assert_eq!(ExerciseKind::from_flags(true, false), ExerciseKind::Bodyweight);
    assert_eq!(ExerciseKind::from_flags(false, false), ExerciseKind::Weighted);
  }

  #[test]
  fn test_target_muscle_json_shape() {
    let json = serde_json::to_string(&TargetMuscle::main(MuscleGroup::Chest)).unwrap();
    assert_eq!(json, r#"{"muscle":"chest","isMain":true}"#);
  }

  #[test]
  fn test_validate_rejects_cardio_with_targets() {
    let master = NewExerciseMaster {
      name: "ランニング".to_string(),
      kind: ExerciseKind::Cardio,
      target_muscles: vec![TargetMuscle::main(MuscleGroup::Quadriceps)],
    };
    assert!(matches!(master.validate(), Err(ModelError::CardioWithTargets(_))));
  }

  #[test]
  fn test_validate_rejects_padded_name() {
    let master = NewExerciseMaster {
      name: " ベンチプレス".to_string(),
      kind: ExerciseKind::Weighted,
      target_muscles: vec![],
    };
    assert!(matches!(master.validate(), Err(ModelError::UntrimmedName(_))));
  }

  #[test]
  fn test_muscle_group_from_str() {
    assert_eq!("hamstrings".parse::<MuscleGroup>(), Ok(MuscleGroup::Hamstrings));
    assert!(matches!("legs".parse::<MuscleGroup>(), Err(ModelError::UnknownMuscle(_))));
  }

  #[test]
  fn test_validate_rejects_duplicate_muscle() {
    let master = NewExerciseMaster {
      name: "ベンチプレス".to_string(),
      kind: ExerciseKind::Weighted,
      target_muscles: vec![
        TargetMuscle::main(MuscleGroup::Chest),
        TargetMuscle::sub(MuscleGroup::Chest),
      ],
    };
    assert!(matches!(master.validate(), Err(ModelError::DuplicateMuscle("chest"))));
  }
}

//! Preset exercise catalog
//!
//! The exercises seeded into a fresh store, and the target-muscle map used both
//! for seeding and for registering exercises discovered during import.

use crate::models::{ExerciseKind, MuscleGroup, NewExerciseMaster, TargetMuscle};

use MuscleGroup::*;

struct Preset {
  name: &'static str,
  kind: ExerciseKind,
  main: &'static [MuscleGroup],
  sub: &'static [MuscleGroup],
}

impl Preset {
  fn target_muscles(&self) -> Vec<TargetMuscle> {
    self
      .main
      .iter()
      .map(|&m| TargetMuscle::main(m))
      .chain(self.sub.iter().map(|&m| TargetMuscle::sub(m)))
      .collect()
  }
}

const fn weighted(
  name: &'static str,
  main: &'static [MuscleGroup],
  sub: &'static [MuscleGroup],
) -> Preset {
  Preset { name, kind: ExerciseKind::Weighted, main, sub }
}

const fn bodyweight(
  name: &'static str,
  main: &'static [MuscleGroup],
  sub: &'static [MuscleGroup],
) -> Preset {
  Preset { name, kind: ExerciseKind::Bodyweight, main, sub }
}

const fn cardio(name: &'static str) -> Preset {
  Preset { name, kind: ExerciseKind::Cardio, main: &[], sub: &[] }
}

const PRESETS: &[Preset] = &[
  // Machines
  weighted("チェストプレス", &[Chest], &[Triceps]),
  weighted("インクラインプレス", &[Chest], &[Shoulder, Triceps]),
  weighted("シーテッドディップ", &[Chest], &[Triceps]),
  weighted("ペクトラル/リバースフライ", &[Chest], &[Back]),
  weighted("ショルダープレス", &[Shoulder], &[Triceps]),
  weighted("スタンディングラテラルレイズ/フライ", &[Shoulder], &[]),
  weighted("ラットプルダウン", &[Back], &[Biceps]),
  weighted("フィクスドプルダウン", &[Back], &[Biceps]),
  weighted("ローロウ", &[Back], &[Biceps]),
  weighted("シーテッドロウ", &[Back], &[Biceps]),
  weighted("レッグプレス", &[Quadriceps], &[Glutes]),
  weighted("レッグエクステンション", &[Quadriceps], &[]),
  weighted("シーテッドレッグカール", &[Hamstrings], &[]),
  weighted("ライイングレッグカール", &[Hamstrings], &[]),
  weighted("インナーサイ/アウターサイ", &[Glutes], &[]),
  weighted("ヒップスラスト", &[Glutes], &[Hamstrings]),
  weighted("バイセプスカール", &[Biceps], &[]),
  weighted("アブドミナルクランチ", &[Abs], &[]),
  weighted("ロータリートルソー", &[Abs], &[]),
  weighted("アシステッドチン/ディップ", &[Back], &[Chest, Biceps, Triceps]),
  weighted("バックエクステンションマシン", &[Back], &[Glutes]),
  // general-purpose, no fixed target
  weighted("デュアルアジャスタブルプーリー", &[], &[]),
  // Free weights
  weighted("ベンチプレス", &[Chest], &[Triceps, Shoulder]),
  weighted("スクワット", &[Quadriceps, Glutes], &[Hamstrings]),
  weighted("デッドリフト", &[Back, Hamstrings, Glutes], &[]),
  weighted("ダンベルプレス", &[Chest], &[Triceps]),
  weighted("ダンベルフライ", &[Chest], &[]),
  weighted("ダンベルカール", &[Biceps], &[]),
  weighted("ダンベルショルダープレス", &[Shoulder], &[Triceps]),
  weighted("ダンベルローイング", &[Back], &[Biceps]),
  weighted("スミスマシン", &[], &[]),
  // Plate loaded
  weighted("チェストプレス（プレートロード）", &[Chest], &[Triceps]),
  weighted("シーテッドチェストプレス（プレートロード）", &[Chest], &[Triceps]),
  weighted("インクラインチェストプレス（プレートロード）", &[Chest], &[Shoulder, Triceps]),
  weighted("ショルダープレス（プレートロード）", &[Shoulder], &[Triceps]),
  weighted("シーテッドロウ（プレートロード）", &[Back], &[Biceps]),
  weighted("ハイロウ（プレートロード）", &[Back], &[Biceps]),
  weighted("4wayロウ（プレートロード）", &[Back], &[Biceps]),
  weighted("アイソラテラルローロウ（プレートロード）", &[Back], &[Biceps]),
  weighted("プルダウン（プレートロード）", &[Back], &[Biceps]),
  weighted("ティーバーロー（プレートロード）", &[Back], &[Biceps]),
  weighted("パワーレッグプレス（プレートロード）", &[Quadriceps], &[Glutes]),
  weighted("ハックスクワット（プレートロード）", &[Quadriceps], &[Glutes]),
  // Bodyweight
  bodyweight("バックエクステンション", &[Back], &[Glutes]),
  bodyweight("シットアップ", &[Abs], &[]),
  bodyweight("チンニング（懸垂）", &[Back], &[Biceps]),
  bodyweight("ディップス", &[Chest, Triceps], &[Shoulder]),
];

/// Mapped but not seeded
const EXTRA_MAPPED: &[Preset] = &[cardio("ランニング"), cardio("バイク")];

/// Number of exercises seeded into an empty store
pub const PRESET_COUNT: usize = PRESETS.len();

fn lookup(name: &str) -> Option<&'static Preset> {
  PRESETS.iter().chain(EXTRA_MAPPED).find(|p| p.name == name)
}

/// Target muscles for a known exercise name; empty for anything unmapped
pub fn preset_target_muscles(name: &str) -> Vec<TargetMuscle> {
  lookup(name).map(Preset::target_muscles).unwrap_or_default()
}

pub fn preset_kind(name: &str) -> Option<ExerciseKind> {
  lookup(name).map(|p| p.kind)
}

/// Masters inserted on first initialization
pub fn preset_exercises() -> Vec<NewExerciseMaster> {
  PRESETS
    .iter()
    .map(|p| NewExerciseMaster {
      name: p.name.to_string(),
      kind: p.kind,
      target_muscles: p.target_muscles(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_preset_count() {
    assert_eq!(PRESET_COUNT, 47);
    assert_eq!(preset_exercises().len(), 47);
  }

  #[test]
  fn test_presets_are_valid_and_unique() {
    let presets = preset_exercises();
    for preset in &presets {
      assert!(preset.validate().is_ok(), "invalid preset {}", preset.name);
    }

    let mut names: Vec<&str> = presets.iter().map(|p| p.name.as_str()).collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), presets.len());
  }

  #[test]
  fn test_bench_press_targets() {
    let targets = preset_target_muscles("ベンチプレス");
    assert_eq!(
      targets,
      vec![
        TargetMuscle::main(Chest),
        TargetMuscle::sub(Triceps),
        TargetMuscle::sub(Shoulder),
      ]
    );
  }

  #[test]
  fn test_multiple_main_muscles() {
    let targets = preset_target_muscles("デッドリフト");
    assert_eq!(targets.len(), 3);
    assert!(targets.iter().all(|t| t.is_main));
  }

  #[test]
  fn test_cardio_mapped_but_not_seeded() {
    assert_eq!(preset_kind("ランニング"), Some(ExerciseKind::Cardio));
    assert!(preset_target_muscles("バイク").is_empty());
    assert!(preset_exercises().iter().all(|p| p.name != "ランニング"));
  }

  #[test]
  fn test_unknown_name() {
    assert!(preset_target_muscles("トライセプスプッシュダウン").is_empty());
    assert_eq!(preset_kind("トライセプスプッシュダウン"), None);
  }
}

//! Prompt builders for plan generation and workout evaluation
//!
//! Pure string assembly. Analytics sections come from the formatter functions
//! of the analytics modules so their wording stays in one place.

use crate::models::{ExerciseMaster, WorkoutLog, WorkoutSet};
use crate::periodization::{format_deload_for_prompt, DeloadSuggestion};
use crate::stagnation::{format_stagnation_for_prompt, StagnationInfo};
use crate::volume::{format_volume_for_prompt, WeeklyVolumeData};

/// Logs shown in the history section of either prompt
pub const HISTORY_LIMIT: usize = 7;

const PLAN_SYSTEM_PROMPT: &str = r#"あなたは経験豊富なパーソナルトレーナーです。
ユーザーの情報と過去のトレーニング履歴を考慮し、今日のトレーニングプランを提案してください。

【重要な指示】
1. 提案する種目は「利用可能な器具」リストに存在するもののみを使用してください
2. 過去の履歴から適切な重量・回数を推測してください
3. 回答は必ず以下のJSON形式で返してください（JSON以外のテキストは含めないでください）

{
  "exercises": [
    {
      "name": "種目名",
      "sets": [
        { "weight": 重量kg（自重の場合は0）, "reps": 回数 }
      ]
    }
  ],
  "advice": "今日のトレーニングに関するアドバイス（任意）"
}"#;

const EVALUATION_HEADER: &str = "あなたは経験豊富なパーソナルトレーナーです。
ユーザーの今日のトレーニングを評価し、フィードバックを提供してください。

【評価のポイント】
1. トレーニングボリューム（種目数、セット数）は適切か
2. 前回と比較して進歩はあるか（重量増加、回数増加など）
3. 種目のバランスは良いか
4. 次回への具体的なアドバイス";

const EVALUATION_FOOTER: &str = "【出力形式】
・簡潔で具体的なフィードバック（200-300文字程度）
・ポジティブな点と改善点をバランスよく
・絵文字を適度に使用してフレンドリーに";

/// ---------------------------------------------------------------------------
/// History Formatting
/// ---------------------------------------------------------------------------

/// Compact set notation: `60kg×10回`, `10回`, `30分`, `30分 / 5km`
pub fn format_set_brief(set: &WorkoutSet) -> String {
  match set {
    WorkoutSet::Weighted { weight, reps } if *weight > 0.0 => format!("{}kg×{}回", weight, reps),
    WorkoutSet::Weighted { reps, .. } | WorkoutSet::Bodyweight { reps } => format!("{}回", reps),
    WorkoutSet::Cardio {
      duration,
      distance: Some(distance),
    } => format!("{}分 / {}km", duration, distance),
    WorkoutSet::Cardio { duration, distance: None } => format!("{}分", duration),
  }
}

fn format_exercise_lines(log: &WorkoutLog, indent: &str) -> String {
  log
    .exercises
    .iter()
    .map(|ex| {
      let sets: Vec<String> = ex.sets.iter().map(format_set_brief).collect();
      format!("{}- {}: {}", indent, ex.name, sets.join(", "))
    })
    .collect::<Vec<_>>()
    .join("\n")
}

pub fn format_workout_logs(logs: &[WorkoutLog]) -> String {
  if logs.is_empty() {
    return "トレーニング履歴はまだありません。".to_string();
  }

  logs
    .iter()
    .map(|log| format!("【{}】\n{}", log.date, format_exercise_lines(log, "  ")))
    .collect::<Vec<_>>()
    .join("\n\n")
}

pub fn format_exercise_masters(masters: &[ExerciseMaster]) -> String {
  masters
    .iter()
    .map(|m| {
      let suffix = if m.is_bodyweight() { "（自重）" } else { "" };
      format!("- {}{}", m.name, suffix)
    })
    .collect::<Vec<_>>()
    .join("\n")
}

/// ---------------------------------------------------------------------------
/// Plan Prompt
/// ---------------------------------------------------------------------------

/// Analytics results embedded in the plan prompt
#[derive(Debug, Clone, Default)]
pub struct PlanAnalytics {
  pub stagnation: Vec<StagnationInfo>,
  pub deload: Option<DeloadSuggestion>,
  pub volume: Vec<WeeklyVolumeData>,
}

impl PlanAnalytics {
  /// Non-empty sections in prompt order
  pub fn sections(&self) -> Vec<String> {
    let mut sections = Vec::new();

    if let Some(deload) = &self.deload {
      sections.push(format_deload_for_prompt(deload));
    }

    let stagnation = format_stagnation_for_prompt(&self.stagnation);
    if !stagnation.is_empty() {
      sections.push(stagnation);
    }

    if let Some(volume) = format_volume_for_prompt(&self.volume) {
      sections.push(volume);
    }

    sections
  }
}

pub fn build_plan_prompt(
  profile: Option<&str>,
  masters: &[ExerciseMaster],
  recent_logs: &[WorkoutLog],
  user_memo: &str,
  analytics: &PlanAnalytics,
) -> String {
  let mut prompt = PLAN_SYSTEM_PROMPT.to_string();

  if let Some(profile) = profile.filter(|p| !p.trim().is_empty()) {
    prompt.push_str(&format!("\n\n■ ユーザープロフィール\n{}", profile));
  }

  prompt.push_str(&format!(
    "\n\n■ 利用可能な器具\n{}",
    format_exercise_masters(masters)
  ));
  prompt.push_str(&format!(
    "\n\n■ 最近のトレーニング履歴（直近{}回分）\n{}",
    HISTORY_LIMIT,
    format_workout_logs(recent_logs)
  ));

  let sections = analytics.sections();
  if !sections.is_empty() {
    prompt.push_str(&format!("\n\n■ トレーニング分析\n{}", sections.join("\n\n")));
  }

  if !user_memo.trim().is_empty() {
    prompt.push_str(&format!("\n\n■ 今日の状態・リクエスト\n{}", user_memo));
  }

  prompt
}

/// ---------------------------------------------------------------------------
/// Evaluation Prompt
/// ---------------------------------------------------------------------------

/// Up to `HISTORY_LIMIT` logs strictly before `log`, excluding `log` itself.
/// `recent` is expected newest first.
pub fn select_previous_logs(recent: &[WorkoutLog], log: &WorkoutLog) -> Vec<WorkoutLog> {
  recent
    .iter()
    .filter(|l| l.id != log.id && l.date < log.date)
    .take(HISTORY_LIMIT)
    .cloned()
    .collect()
}

pub fn build_evaluation_prompt(
  profile: Option<&str>,
  log: &WorkoutLog,
  previous_logs: &[WorkoutLog],
) -> String {
  let profile_block = profile
    .filter(|p| !p.trim().is_empty())
    .map(|p| format!("■ ユーザープロフィール\n{}\n", p))
    .unwrap_or_default();

  let history = if previous_logs.is_empty() {
    "まだ過去の記録がありません".to_string()
  } else {
    format_workout_logs(previous_logs)
  };

  format!(
    "{}\n\n{}\n■ 今日のトレーニング（{}）\n{}\n\n■ 過去のトレーニング履歴\n{}\n\n{}",
    EVALUATION_HEADER,
    profile_block,
    log.date,
    format_exercise_lines(log, ""),
    history,
    EVALUATION_FOOTER
  )
}

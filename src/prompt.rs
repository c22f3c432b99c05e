use crate::models::{CoachRequest, Lift};

pub const MAX_PROMPT_LIFTS: usize = 5;

const DEFAULT_GOAL: &str = "general fitness";

const COACHING_RULES: &str = "\
Rules:
- Be concise and practical: short paragraphs or bullet points, no filler.
- Respect the listed injuries. Never program a movement that loads an injured area; offer a safe substitution instead.
- For nutrition, give macros in grams per kilogram of bodyweight: protein 1.6-2.2 g/kg, fat 0.6-1.0 g/kg, carbohydrates fill the remaining calories.
- Do not diagnose, treat, or make medical claims. For pain, symptoms, or medication questions, tell the user to see a qualified clinician.";

pub fn goal_label(goal: Option<&str>) -> &'static str {
  match goal.map(|g| g.trim().to_ascii_lowercase()).as_deref() {
    Some("gain") => "hypertrophy & mild surplus",
    Some("lose") => "fat loss & mild deficit",
    Some("tone") => "recomposition",
    Some("strength") => "max strength",
    _ => DEFAULT_GOAL,
  }
}

fn render_injuries(injuries: &[String]) -> String {
  if injuries.is_empty() {
    "none reported".to_string()
  } else {
    injuries.join(", ")
  }
}

fn render_lift(lift: &Lift) -> String {
  let name = lift.name.as_deref().unwrap_or("lift");
  let best = lift.best.as_deref().unwrap_or("?");
  match lift.reps.as_deref() {
    Some(reps) => format!("{name}: {best}×{reps}"),
    None => format!("{name}: {best}"),
  }
}

fn render_lifts(lifts: &[Lift]) -> String {
  if lifts.is_empty() {
    return "none logged".to_string();
  }
  lifts
    .iter()
    .take(MAX_PROMPT_LIFTS)
    .map(render_lift)
    .collect::<Vec<_>>()
    .join("; ")
}

fn render_weight(weight_lb: Option<&str>) -> String {
  match weight_lb {
    Some(weight) => format!("{weight} lb"),
    None => "unknown".to_string(),
  }
}

pub fn build_system_prompt(req: &CoachRequest) -> String {
  format!(
    "You are a strength and nutrition coach.\n\
     Athlete profile:\n\
     - Goal: {goal}\n\
     - Injuries: {injuries}\n\
     - Bodyweight: {weight}\n\
     - Recent lifts: {lifts}\n\
     {rules}",
    goal = goal_label(req.goal.as_deref()),
    injuries = render_injuries(&req.injuries),
    weight = render_weight(req.weight_lb.as_deref()),
    lifts = render_lifts(&req.recent_lifts),
    rules = COACHING_RULES,
  )
}

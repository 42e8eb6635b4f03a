//! Generation instruction for the plan model.
//!
//! The prompt is pure text: no I/O, and identical inputs always render the
//! same string.

use super::DetailLevel;

const ROLE: &str = "You are an experienced project manager and strategic planner. \
You turn ambitious goals into actionable project plans made of phases and tasks.";

/// JSON shape the model is asked to produce.
const SCHEMA_REFERENCE: &str = r#"Produce the plan as a single JSON object with this structure:
{
  "id": "unique-id",
  "goal": "the user's goal",
  "timeline": "the user's timeline",
  "totalEstimatedTime": "total estimated time",
  "phases": [
    {
      "id": "phase-id",
      "title": "Phase title",
      "description": "What this phase achieves",
      "estimatedDuration": "duration",
      "tasks": [
        {
          "id": "task-id",
          "title": "Task title",
          "description": "Concrete description of the task",
          "estimatedTime": "time estimate",
          "priority": "high|medium|low",
          "dependencies": ["ids of tasks that must be completed first"]
        }
      ]
    }
  ],
  "createdAt": "current ISO-8601 date"
}"#;

const GUIDELINES: &str = "Guidelines:
- Use between 3 and 6 phases, depending on the complexity of the goal
- Give every phase between 3 and 8 actionable tasks
- Keep tasks specific, measurable and realistic
- Make time estimates add up logically across tasks, phases and the total
- Set priorities from each task's dependencies and importance
- Fit durations to the user's timeline
- Write clear, actionable descriptions in professional project management language";

const DETAIL_GUIDELINES: &str = "Detail levels:
- basic: high-level phases with the essential tasks only
- detailed: a comprehensive breakdown covering most necessary tasks
- comprehensive: an exhaustive roadmap with every task and consideration";

const OUTPUT_DIRECTIVE: &str =
    "Return only the JSON object. Do not add any text, explanation or markdown formatting.";

/// Render the instruction text for a plan request.
pub fn build_prompt(goal: &str, timeline: &str, detail_level: DetailLevel) -> String {
    format!(
        "{ROLE}\n\n{SCHEMA_REFERENCE}\n\n{GUIDELINES}\n\n{DETAIL_GUIDELINES}\n\n\
Create a {detail_level} project plan for:\nGoal: {goal}\nTimeline: {timeline}\n\n{OUTPUT_DIRECTIVE}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_inputs() {
        let prompt = build_prompt("Learn Rust", "6 weeks", DetailLevel::Comprehensive);
        assert!(prompt.contains("Goal: Learn Rust"));
        assert!(prompt.contains("Timeline: 6 weeks"));
        assert!(prompt.contains("Create a comprehensive project plan"));
    }

    #[test]
    fn test_prompt_describes_schema_and_rules() {
        let prompt = build_prompt("g", "t", DetailLevel::Basic);
        assert!(prompt.contains("\"priority\": \"high|medium|low\""));
        assert!(prompt.contains("\"estimatedDuration\""));
        assert!(prompt.contains("between 3 and 6 phases"));
        assert!(prompt.contains("between 3 and 8 actionable tasks"));
        assert!(prompt.contains("add up logically"));
        assert!(prompt.trim_end().ends_with(OUTPUT_DIRECTIVE));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        for level in [
            DetailLevel::Basic,
            DetailLevel::Detailed,
            DetailLevel::Comprehensive,
        ] {
            let a = build_prompt("Open a bakery", "1 year", level);
            let b = build_prompt("Open a bakery", "1 year", level);
            assert_eq!(a, b);
            assert!(a.contains(level.as_str()));
        }
    }

    #[test]
    fn test_prompt_keeps_braces_in_goal() {
        let prompt = build_prompt("Parse {json} files", "2 days", DetailLevel::Detailed);
        assert!(prompt.contains("Goal: Parse {json} files"));
    }
}

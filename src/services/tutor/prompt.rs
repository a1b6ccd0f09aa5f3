//! 导师系统提示词

use crate::models::{GradeLevel, UserRole};

const PERSONA: &str = "You are an AI tutor for homeschooling students following the Indian open school syllabus.\nYour goal is to provide personalized, engaging, and educational support to students.";

const GUIDELINES: [&str; 10] = [
    "Be patient, encouraging, and supportive",
    "Provide clear, step-by-step explanations",
    "Use examples relevant to Indian context when possible",
    "Ask questions to check understanding",
    "Provide practice problems when appropriate",
    "Adapt to the student's pace and understanding level",
    "Be conversational and engaging",
    "Avoid giving direct answers - guide the student to find solutions",
    "Use simple language appropriate for the grade level",
    "Incorporate Indian educational examples and references when relevant",
];

const REMINDER: &str = "Remember: You are a tutor, not just an answer provider. Focus on helping the student learn and understand concepts.";

/// 构建提示词所需的用户上下文
#[derive(Debug, Clone)]
pub struct PromptContext<'a> {
    pub user_name: &'a str,
    pub role: UserRole,
    /// 仅学生有年级
    pub grade_level: Option<GradeLevel>,
    pub subject: Option<&'a str>,
    pub topic: Option<&'a str>,
}

/// 生成系统提示词
pub fn build_system_prompt(ctx: &PromptContext<'_>) -> String {
    let mut prompt = format!(
        "{}\n\nCurrent user: {}\nUser role: {}",
        PERSONA, ctx.user_name, ctx.role
    );

    if let Some(grade) = ctx.grade_level {
        prompt.push_str(&format!(
            "\nGrade level: {}\n\nPlease adapt your teaching style and complexity to match this grade level.",
            grade.label()
        ));
    }

    if let Some(subject) = ctx.subject {
        prompt.push_str(&format!("\nCurrent subject: {}", subject));
    }

    if let Some(topic) = ctx.topic {
        prompt.push_str(&format!("\nCurrent topic: {}", topic));
    }

    prompt.push_str("\n\nTeaching guidelines:");
    for (i, guideline) in GUIDELINES.iter().enumerate() {
        prompt.push_str(&format!("\n{}. {}", i + 1, guideline));
    }

    prompt.push_str("\n\n");
    prompt.push_str(REMINDER);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_prompt_includes_grade_and_context() {
        let prompt = build_system_prompt(&PromptContext {
            user_name: "Asha",
            role: UserRole::Student,
            grade_level: Some(GradeLevel::Secondary8),
            subject: Some("Mathematics"),
            topic: Some("Fractions"),
        });

        assert!(prompt.starts_with("You are an AI tutor"));
        assert!(prompt.contains("Current user: Asha\nUser role: STUDENT"));
        assert!(prompt.contains("Grade level: Secondary 8"));
        assert!(prompt.contains("adapt your teaching style"));
        assert!(prompt.contains("Current subject: Mathematics"));
        assert!(prompt.contains("Current topic: Fractions"));
        assert!(prompt.contains("\n10. Incorporate Indian educational examples"));
        assert!(prompt.ends_with(REMINDER));
    }

    #[test]
    fn test_non_student_prompt_omits_grade() {
        let prompt = build_system_prompt(&PromptContext {
            user_name: "Ravi",
            role: UserRole::Parent,
            grade_level: None,
            subject: None,
            topic: None,
        });

        assert!(prompt.contains("User role: PARENT"));
        assert!(!prompt.contains("Grade level"));
        assert!(!prompt.contains("Current subject"));
        assert!(!prompt.contains("Current topic"));
        assert!(prompt.contains("Teaching guidelines:\n1. Be patient"));
    }
}

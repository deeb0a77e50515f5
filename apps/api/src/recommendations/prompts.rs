// Prompt templates for the Recommendation Gateway.
// Replace `{placeholder}` tokens before sending.

pub const STUDENT_MARKER: &str = "Student Recommendation:";
pub const TEACHER_MARKER: &str = "Teacher Strategy:";
pub const FINDINGS_MARKER: &str = "Key Findings:";
pub const RECOMMENDATIONS_MARKER: &str = "Recommendations:";

/// Per-student recommendation. Replace `{trait}`.
pub const STUDENT_RECOMMENDATION_TEMPLATE: &str = "\
A student has a dominant personality trait of {trait}.
1. Give a personalized learning recommendation for the student.
2. Suggest an appropriate teaching strategy for the teacher.
Format your response like this:

Student Recommendation: ...
Teacher Strategy: ...";

/// Class-wide recommendation. Replace `{trait}`.
pub const CLASS_RECOMMENDATION_TEMPLATE: &str = "\
Based on the class-wide dominant personality trait: {trait}, provide general study \
recommendations for students and teaching strategies for educators.
Format your response like this:

Student Recommendation: ...
Teacher Strategy: ...";

/// Per-trait insights in JSON mode. Replace `{scores}` with a JSON object.
pub const TRAIT_INSIGHTS_TEMPLATE: &str = r#"You are a psychology-based teaching support AI.
Based on the following Big Five trait scores of a student, generate for each trait:
1. A one-sentence interpretation of what this score might say about the student's personality.
2. A one-sentence teaching recommendation to help teachers handle this student more effectively.
Just return a JSON object like this:
{ "TraitName": { "interpretation": "...", "recommendation": "..." } }

Scores: {scores}"#;

/// Teaching intervention for one trait. Replace `{trait}`.
pub const TRAIT_INTERVENTION_TEMPLATE: &str = "\
Based on the Big Five Personality Trait model, provide a JSON object with a single key \
called 'recommendation' that describes classroom teaching strategies suitable for students \
with dominant '{trait}' personality. Be concise and actionable.";

/// Class key findings. Replace `{averages}`, `{most_common}`, `{highest}`, `{lowest}`.
pub const KEY_FINDINGS_TEMPLATE: &str = "\
You are given a class personality analysis. Here are the stats:
- Average Trait Scores: {averages}
- Most Common Dominant Trait: {most_common}
- Highest Scoring Trait: {highest}
- Lowest Scoring Trait: {lowest}

Generate:
1. 3-5 Key Findings summarizing the student group's personality profile.
2. 3-5 Specific Teaching Recommendations.

Use bullet points. Be specific. Do not repeat generic traits. Prioritize what is unique to this group.
Respond in this format:
Key Findings:
- ...
Recommendations:
- ...";

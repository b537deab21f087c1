// Tailoring Prompts
// Every prompt uses a structured JSON output schema, validated by llm_client::parse_generation.
// Placeholders are filled with `.replace("{name}", value)`.

pub const RANK_SYSTEM_ROLE: &str =
    "You are a senior technical recruiter building a candidate's resume for a specific job.";

/// Ranking prompt. Returns `{"project_titles": [...]}`.
pub const RANK_PROMPT_TEMPLATE: &str = r#"Select and order the top {k} most relevant projects from the candidate's list for the job description below, most relevant first.
Maximize keyword overlap and favor the most complex, applicable work.
Use the project titles exactly as written. Return at most {k} titles.

JOB DESCRIPTION:
{target}

CANDIDATE'S PROJECTS:
{candidates}

Return JSON matching this schema exactly:
{"project_titles": ["<title>", "..."]}"#;

pub const SHORTEN_SYSTEM_ROLE: &str = "You are a precise resume editor who shortens text without losing information.";

/// Shortening prompt. Returns `{"rewritten_text": "..."}`.
pub const SHORTEN_PROMPT_TEMPLATE: &str = r#"Shorten this project description slightly while keeping all information. Keep at least 3 lines: the first an overview (what, why, how), then details, and last the 'Technologies used:' line.
Shorten long lines and combine them if needed. Use the action verb, duty, result pattern for every line except the last.
The whole resume is currently {overage} lines too long and this is one of its projects. If it is more than about 1.5 lines too long, remove a line from this project.
{one_per_line}
{no_invention}

ORIGINAL:
{entry}

JOB DESCRIPTION for context:
{target}

Return JSON matching this schema exactly:
{"rewritten_text": "<line one>\n<line two>\n..."}"#;

pub const EMPHASIZE_SYSTEM_ROLE: &str =
    "You are a resume optimizer who highlights keywords without changing any wording.";

/// Emphasis prompt. Returns `{"emphasized_text": "..."}`.
pub const EMPHASIZE_PROMPT_TEMPLATE: &str = r#"Bold the keywords from the job description that appear in this project description by wrapping them in double asterisks, like **keyword**.
Bold each unique keyword only once, at its most impactful location.
Do not change any other character: spacing, punctuation, line breaks and wording must stay identical.
Do not bold any of these keywords, which are already bolded elsewhere in the resume: {already_emphasized}

JOB DESCRIPTION:
{target}

PROJECT DESCRIPTION:
{entry}

Return JSON matching this schema exactly:
{"emphasized_text": "<the description with markers>"}"#;

pub const SUMMARY_SYSTEM_ROLE: &str = "You are an expert resume writer.";

/// Summary prompt. Returns `{"rewritten_text": "..."}`.
pub const SUMMARY_PROMPT_TEMPLATE: &str = r#"Using the job description and the candidate's full resume, write a concise professional summary of 2-3 sentences in the first person.
Tailor it to the job, highlighting the most relevant skills and experience. Open with a strong statement about the candidate's profile and mention their degree and year of study.
Wrap the year of study in double asterisks (for example **third-year**) and nothing else.

JOB DESCRIPTION:
{target}

CANDIDATE'S FULL RESUME:
{resume}

Return JSON matching this schema exactly:
{"rewritten_text": "<summary>"}"#;

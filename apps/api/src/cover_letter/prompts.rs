// Cover Letter Prompts
// Sections prompt returns {"introduction", "conclusion"}; body prompt returns {"rewritten_text"}.

pub const LETTER_SYSTEM_ROLE: &str = "You are an expert cover letter writer.";

pub const SECTIONS_PROMPT_TEMPLATE: &str = r#"Write the introduction and the conclusion of a cover letter for the job below.

The introduction should:
1. Open with a creative hook that reflects the company's values and the candidate's genuine interest and commitment.
2. Avoid stock openers such as "I'm excited to apply" or "Imagine".
3. Show rather than tell, setting a theme that carries through the letter.
4. Be 3-4 sentences.

The conclusion should:
1. Continue the introduction's theme as a final, professional pitch.
2. Thank the reader and invite an interview without being pushy.
3. Be 3-4 sentences.

Do not use em dashes.
{revision}
JOB DESCRIPTION:
{target}

CANDIDATE'S RESUME:
{resume}

Return JSON matching this schema exactly:
{"introduction": "<text>", "conclusion": "<text>"}"#;

pub const BODY_PROMPT_TEMPLATE: &str = r#"Write 3-4 body paragraphs for a cover letter that continue the theme of the introduction and lead naturally into the conclusion.
Draw concrete evidence from the candidate's projects. Separate paragraphs with a blank line. Do not use em dashes.
{length}
{revision}
INTRODUCTION:
{introduction}

CONCLUSION:
{conclusion}

JOB DESCRIPTION:
{target}

CANDIDATE'S RESUME:
{resume}

PROJECTS:
{projects}

Return JSON matching this schema exactly:
{"rewritten_text": "<paragraphs>"}"#;

pub const REVISION_TEMPLATE: &str = r#"
This is a revision. Incorporate all of the reader's feedback, oldest first:
{feedback}

CURRENT VERSION:
{current}
"#;

pub const LENGTH_SHORTEN: &str =
    "The whole letter is currently {lines} lines; shorten the body so the letter fits in {max} lines.";
pub const LENGTH_EXPAND: &str =
    "The whole letter is currently {lines} lines; expand the body so the letter reaches at least {min} lines.";

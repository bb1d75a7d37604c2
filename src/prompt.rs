//! Prompt text sent to the provider
use crate::schema::SchemaNode;
use crate::validation::BirthRequest;

/// Builds the single user message for a story request.
///
/// The birth details are embedded exactly as received. The expected reply shape is rendered from
/// `schema` so the prompt and the reply checks always agree.
pub fn build_story_prompt(request: &BirthRequest, schema: &SchemaNode) -> String {
    let time_note = if request.approximate_time {
        " (approximate, the parents are not sure of the exact minute)"
    } else {
        ""
    };
    // Pretty printing a Value cannot fail; fall back to the compact form regardless.
    let shape = serde_json::to_string_pretty(&schema.example())
        .unwrap_or_else(|_| schema.example().to_string());

    format!(
        "You are a warm, playful storyteller writing a keepsake for new parents.\n\
         Write a personalised \"welcome to the world\" story for this baby:\n\
         \n\
         Name: {name}\n\
         Birth date: {date}\n\
         Birth time: {time}{time_note}\n\
         Birth city: {city}\n\
         \n\
         Cover their sun, moon and rising signs, two real historical events that happened on \
         their birthday plus a fun fact, their life path number, and three parenting tips. Use \
         emojis generously in titles and icons. Keep every text field to one or two sentences.\n\
         \n\
         Respond with exactly one JSON object and nothing else: no markdown, no code fences, no \
         commentary. Use this structure, replacing every example value with your own content \
         and keeping every field name unchanged:\n\
         {shape}\n",
        name = request.baby_name,
        date = request.birth_date,
        time = request.birth_time,
        city = request.birth_city,
    )
}

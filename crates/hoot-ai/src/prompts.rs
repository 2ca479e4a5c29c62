//! Prompt builders. Every builder is a pure function of its inputs.

use crate::verdict::VideoMetadata;

/// Description characters forwarded to the classifier
pub const DESCRIPTION_LIMIT: usize = 300;

fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[must_use]
pub fn video_analysis_prompt(video: &VideoMetadata, goal: &str) -> String {
    let channel = video.channel.as_deref().unwrap_or("Unknown");
    let description = video
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map_or_else(|| "N/A".to_string(), |d| truncate_chars(d, DESCRIPTION_LIMIT));

    format!(
        "You are Focus Hoot, an AI that helps users stay focused on their goals.\n\
         \n\
         User's Goal: \"{goal}\"\n\
         \n\
         Video Information:\n\
         - Title: {title}\n\
         - Channel: {channel}\n\
         - Description: {description}\n\
         \n\
         Task: Determine if this video is RELEVANT to the user's goal or a DISTRACTION.\n\
         \n\
         Response Rules:\n\
         1. If the video directly helps achieve the goal -> \"allow\"\n\
         2. If the video is entertainment, off-topic, or procrastination -> \"block\"\n\
         3. Be strict but fair - consider context\n\
         4. Educational content related to the goal should be allowed\n\
         5. Entertainment, vlogs, gaming, funny videos should be blocked unless they match the goal\n\
         6. Provide a brief reason (1 sentence, casual tone)\n\
         \n\
         Return ONLY valid JSON in this format:\n\
         {{\n  \"decision\": \"allow\" or \"block\",\n  \"reason\": \"Brief explanation here\"\n}}",
        title = video.title,
    )
}

#[must_use]
pub fn block_list_prompt(goal: &str) -> String {
    format!(
        "You are Focus Hoot, an AI that helps users stay focused on their goals.\n\
         \n\
         User's Goal: \"{goal}\"\n\
         \n\
         List up to 10 website domains that would most likely distract this user from the goal.\n\
         Only include bare domains such as \"example.com\". Never include sites that help with the goal.\n\
         \n\
         Return ONLY valid JSON in this format:\n\
         {{\n  \"domains\": [\"example.com\"]\n}}"
    )
}

#[must_use]
pub fn roast_prompt(goal: &str, title: &str, channel: Option<&str>, time_of_day: &str) -> String {
    let video_info = match channel {
        Some(channel) => format!("\"{title}\" by {channel}"),
        None => format!("\"{title}\""),
    };

    format!(
        "You are Focus Hoot, a witty owl AI assistant that roasts users when they get distracted.\n\
         \n\
         User said they wanted to focus on: \"{goal}\"\n\
         But they just tried to watch: {video_info}\n\
         Current time: {time_of_day}\n\
         \n\
         Generate a SHORT, FUNNY, slightly sassy roast (2-3 sentences max) that:\n\
         1. Calls out the hypocrisy between their goal and what they tried to watch\n\
         2. Uses owl puns or wisdom themes occasionally (but not always)\n\
         3. Is playful and motivating, not mean-spirited\n\
         4. Ends with encouragement to get back on track\n\
         5. Makes it personal to their specific goal and the video they tried to watch\n\
         \n\
         Tone: Playful, witty, supportive friend who caught you slacking\n\
         \n\
         Return ONLY the roast text, no quotes, no extra formatting."
    )
}

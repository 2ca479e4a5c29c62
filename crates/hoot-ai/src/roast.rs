//! Block-surface roasts.

/// Shown when the model cannot produce a roast
pub const STATIC_ROASTS: &[&str] = &[
    "You really thought I wouldn't notice you sneaking off during a focus session?",
    "Your future self is disappointed. Get back to work!",
    "That site can wait. Your goals can't. Focus up!",
    "Scrolling won't get you closer to your goal. But working will!",
    "Nice try sneaking off. I'm watching you!",
    "Your brain said 'quick break' but we both know that's a lie. Back to work!",
    "That dopamine hit from scrolling? Not worth it. Your goal is!",
    "Plot twist: you're stronger than your distractions. Prove it!",
    "Every scroll is a step away from success. Every focus session is a step toward it.",
    "Your goal won't achieve itself while you're scrolling. Let's go!",
    "Caught red-handed! Now get back to being productive!",
    "This site will still be there after your session. Your focus won't. Choose wisely.",
    "You're better than this distraction. Show me what you've got!",
    "Imagine how good you'll feel AFTER you complete your goal. Hold that thought!",
    "That site is a time thief. Don't let it rob you of success!",
];

/// Pick a static roast; any index is valid
#[must_use]
pub fn static_roast(index: usize) -> &'static str {
    STATIC_ROASTS[index % STATIC_ROASTS.len()]
}

/// Roast used when a video was blocked and the model gave nothing back
#[must_use]
pub fn fallback_video_roast(goal: &str, title: &str) -> String {
    format!(
        "Hmm, I'm at a loss for words. You said you were focusing on \"{goal}\", \
         but here you are trying to watch \"{title}\"? Come on, you know better than this!"
    )
}

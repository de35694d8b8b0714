//! Prompt assembly for copywriting and image generation.

use std::fmt::Write as _;

use redpost_trending::TrendingSnapshot;

/// Style tag → style description injected into the copywriting prompt.
pub const STYLE_PROMPTS: &[(&str, &str)] = &[
    (
        "干货分享",
        "专业知识分享风格，条理清晰，用数据和事实说话，适当使用 emoji 增加可读性",
    ),
    (
        "种草推荐",
        "真诚推荐风格，从个人使用体验出发，突出产品/服务的亮点和实际效果",
    ),
    ("经验分享", "过来人的口吻，分享踩坑经历和实用技巧，亲切自然"),
    ("教程攻略", "手把手教学风格，步骤清晰，图文并茂，新手友好"),
    ("生活记录", "记录生活的美好瞬间，文字温暖有感染力，配图精致"),
];

pub const DEFAULT_STYLE: &str = "干货分享";

/// Looks up a style description, falling back to the default style for
/// unknown tags.
#[must_use]
pub fn style_prompt(style: &str) -> &'static str {
    STYLE_PROMPTS
        .iter()
        .find(|(tag, _)| *tag == style)
        .or_else(|| STYLE_PROMPTS.iter().find(|(tag, _)| *tag == DEFAULT_STYLE))
        .map(|(_, desc)| *desc)
        .unwrap_or_default()
}

/// Builds the copywriting prompt sent to the gateway.
#[must_use]
pub fn copywriting_prompt(
    topic: &str,
    style_desc: &str,
    trending_context: &str,
    image_count: usize,
) -> String {
    format!(
        r#"你是一个专业的小红书内容创作者。请根据以下要求生成一篇小红书笔记。

主题：{topic}
风格：{style_desc}
{trending_context}

要求：
1. 标题：吸引眼球，10-25字，可以用 emoji，要有关键词
2. 正文：300-800字，分段清晰，适当使用 emoji，符合小红书的阅读习惯
3. 话题标签：5-8个相关话题，每个2-6字
4. 图片描述：为每张配图写一段英文描述（用于 AI 图片生成），要具体、有画面感、适合小红书风格

请严格按以下 JSON 格式输出（不要包含 markdown 代码块标记）：
{{
    "title": "标题",
    "content": "正文内容（包含 emoji 和换行）",
    "topics": ["话题1", "话题2", "话题3", "话题4", "话题5"],
    "image_prompts": [
        "English description for image 1, detailed and specific",
        "English description for image 2, detailed and specific"
    ]
}}

注意：
- image_prompts 数量要求：{image_count} 张
- 标题不超过 50 字
- 正文不超过 1000 字
- 每个话题不超过 20 字
- 图片描述要用英文，要具体到颜色、构图、风格
"#
    )
}

/// Platform-style framing prepended to every image prompt.
#[must_use]
pub fn enhance_image_prompt(prompt: &str) -> String {
    format!(
        "Create a beautiful, high-quality image suitable for Xiaohongshu (Little Red Book) \
         social media post. Style: clean, aesthetic, Instagram-worthy. {prompt}"
    )
}

/// Formats a snapshot as reference context for the copywriting prompt:
/// the top-10 keyword line plus the five most engaged note titles.
#[must_use]
pub fn trending_context(snapshot: &TrendingSnapshot) -> String {
    let mut out = String::from("以下是当前小红书热门内容供参考：\n\n");

    if !snapshot.analysis.top_keywords.is_empty() {
        let keywords: Vec<&str> = snapshot
            .analysis
            .top_keywords
            .iter()
            .take(10)
            .map(|k| k.word.as_str())
            .collect();
        let _ = writeln!(out, "热门关键词：{}", keywords.join(", "));
    }

    for (i, note) in snapshot.notes.iter().take(5).enumerate() {
        let _ = writeln!(out, "{}. {} (点赞: {})", i + 1, note.title, note.likes);
    }

    out
}

//! Generation requests per platform.
//!
//! Every request carries a role instruction (who is writing, what is never
//! allowed) and a task instruction (the entity context plus the output format
//! the parser in [`crate::generator::parse`] expects).

use chrono::{Datelike, NaiveDate};
use syndic_state::{Entity, Platform, SourceNotes};

use crate::angles::Angle;
use crate::generator::parse::{TITLE_MARKER, VARIANT_DELIMITER};
use crate::generator::GenerationRequest;
use crate::platforms::{subreddit_guidance, tags_for, PlatformProfile};

/// Which localized fields feed the context block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    En,
    Ja,
}

/// Everything needed to build one request.
#[derive(Debug, Clone)]
pub struct PromptInput<'a> {
    pub entity: &'a Entity,
    pub profile: &'a PlatformProfile,
    pub angle: Option<&'static Angle>,
    /// Community destination, e.g. a subreddit.
    pub destination: Option<&'a str>,
    pub previous_titles: &'a [String],
    pub today: NaiveDate,
    pub site_url: Option<&'a str>,
}

/// Hub article on the portfolio site that long-form posts link back to.
pub fn blog_article_url(site_url: &str, slug: &str) -> String {
    format!("{}/blog/{}-guide/", site_url.trim_end_matches('/'), slug)
}

fn pick<'a>(locale: Locale, en: &'a str, ja: Option<&'a str>) -> &'a str {
    match locale {
        Locale::Ja => ja.filter(|s| !s.is_empty()).unwrap_or(en),
        Locale::En => en,
    }
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|i| format!("- {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// "Primary material" block built from source notes; empty when there are none.
pub fn source_notes_section(notes: Option<&SourceNotes>) -> String {
    let Some(notes) = notes.filter(|n| !n.is_empty()) else {
        return String::new();
    };
    let groups = [
        ("Experiences", &notes.experiences),
        ("Observations", &notes.observations),
        ("Measured data", &notes.metrics),
        ("Failures and dead ends", &notes.failures),
    ];
    let sections: Vec<String> = groups
        .iter()
        .filter(|(_, items)| !items.is_empty())
        .map(|(label, items)| format!("[{label}]\n{}", bullet_list(items)))
        .collect();
    format!(
        "\n\n--- Primary material (real data and experience; build the piece around it) ---\n{}",
        sections.join("\n\n")
    )
}

/// Full context for articles and community posts.
pub fn project_context_full(entity: &Entity, locale: Locale) -> String {
    let features = entity
        .features
        .iter()
        .map(|f| {
            format!(
                "- {}: {}",
                pick(locale, &f.title, f.title_ja.as_deref()),
                pick(locale, &f.description, f.description_ja.as_deref())
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let context = format!(
        "Name: {name}\nTagline: {tagline}\nDescription: {description}\nTarget audience: {audience}\nUser problem: {problem}\nSolution: {solution}\nFeatures:\n{features}\nCall to action: {cta}\nURL: {url}\nKeywords: {keywords}{notes}",
        name = pick(locale, &entity.name, entity.name_ja.as_deref()),
        tagline = pick(locale, &entity.tagline, entity.tagline_ja.as_deref()),
        description = pick(locale, &entity.description, entity.description_ja.as_deref()),
        audience = entity.target_audience.join(", "),
        problem = problem(entity, locale),
        solution = solution(entity, locale),
        cta = entity.call_to_action.as_deref().unwrap_or("Learn more"),
        url = entity.primary_url().unwrap_or_default(),
        keywords = entity.keywords().join(", "),
        notes = source_notes_section(entity.source_notes.as_ref()),
    );
    context.trim().to_string()
}

/// Context for short peer-voice posts. Leaves out the tech stack: those posts
/// must not name technologies.
pub fn project_context_short(entity: &Entity) -> String {
    let features = entity
        .features
        .iter()
        .map(|f| format!("- {}", f.title))
        .collect::<Vec<_>>()
        .join("\n");
    let context = format!(
        "Name: {}\nTagline: {}\nTarget audience: {}\nUser problem: {}\nSolution: {}\nFeatures:\n{}\nHashtag candidates: {}{}",
        entity.name,
        entity.tagline,
        entity.target_audience.join(", "),
        problem(entity, Locale::En),
        solution(entity, Locale::En),
        features,
        entity.keywords().join(", "),
        source_notes_section(entity.source_notes.as_ref()),
    );
    context.trim().to_string()
}

fn problem(entity: &Entity, locale: Locale) -> &str {
    let en = entity.user_problem.as_deref().unwrap_or("not specified");
    pick(locale, en, entity.user_problem_ja.as_deref())
}

fn solution(entity: &Entity, locale: Locale) -> &str {
    let en = entity.solution.as_deref().unwrap_or("not specified");
    pick(locale, en, entity.solution_ja.as_deref())
}

fn title_exclusion(previous: &[String]) -> String {
    if previous.is_empty() {
        return String::new();
    }
    format!(
        "\nDo NOT reuse these titles or close variations:\n{}",
        bullet_list(previous)
    )
}

fn angle_block(angle: Option<&Angle>) -> String {
    angle
        .map(|a| format!("Article angle: {}\n{}\n\n", a.label, a.instruction))
        .unwrap_or_default()
}

const SHARED_BANS: &str = "- No rankings or listicles (\"top 5\", \"best 10\"), no star ratings or scores\n\
- No hype or promotional phrasing (\"game-changer\", \"revolutionary\", \"check it out\")\n\
- No placeholder text, TODO markers, bracketed fill-ins or unfinished sections";

/// Build the request for one platform.
pub fn build_request(input: &PromptInput<'_>) -> GenerationRequest {
    let platform = input.profile.platform;
    let purpose = match (input.angle, input.destination) {
        (_, Some(dest)) => format!("{platform} post (r/{dest})"),
        (Some(angle), None) => format!("{platform} article ({})", angle.id),
        (None, None) => format!("{platform} content"),
    };
    let (role, task) = match platform {
        Platform::Twitter | Platform::Bluesky | Platform::Mastodon => short_post(input),
        Platform::Reddit => community_post(input),
        Platform::Qiita => qiita_article(input),
        Platform::Zenn => zenn_article(input),
        Platform::Blog => blog_post(input),
        Platform::Devto | Platform::Hashnode | Platform::GithubReleases => english_article(input),
    };
    GenerationRequest::new(role, task).with_purpose(purpose)
}

fn english_article(input: &PromptInput<'_>) -> (String, String) {
    let year = input.today.year();
    let role = format!(
        "You are someone who belongs to the target audience. Write an article sharing your genuine experience and knowledge with peers who face similar challenges.\n\n\
{angle}Rules:\n\
- You are NOT a marketer. You are a peer sharing what you know.\n\
- Write in natural, conversational English\n\
- The article must be useful to readers even if they never use your tool\n\
- Your project may appear as \"something I use/built\", but it is NOT the focus\n\
- Use {year} for any year references and never mention earlier years\n\
- 800-1500 words (at least {min} characters)\n\
- First line: \"{marker} your article title\"; second line empty; article body in Markdown from the third line\n\
{bans}{exclusion}",
        angle = angle_block(input.angle),
        min = input.profile.min_len.unwrap_or_default(),
        marker = TITLE_MARKER,
        bans = SHARED_BANS,
        exclusion = title_exclusion(input.previous_titles),
    );
    let link = input
        .site_url
        .map(|site| {
            format!(
                "\nAt the end of the article, include a natural reference like \"I wrote a more detailed guide on my blog: {}\"",
                blog_article_url(site, &input.entity.slug)
            )
        })
        .unwrap_or_default();
    let task = format!(
        "Think about what the target audience would search for. Write an article that answers their question or solves their problem{angle}.{link}\n\nProject context:\n{context}\n\nFirst line must be \"{marker} your article title\".",
        angle = input
            .angle
            .map(|a| format!(", using the \"{}\" angle", a.label))
            .unwrap_or_default(),
        context = project_context_full(input.entity, Locale::En),
        marker = TITLE_MARKER,
    );
    (role, task)
}

fn japanese_rules(input: &PromptInput<'_>) -> String {
    format!(
        "ルール:\n\
- 自然な日本語で、読者の役に立つ実践的な内容にする\n\
- 本文は{min}字以上\n\
- コードブロックを{code}個以上含める\n\
- 年に触れる場合は{year}年を使い、それより前の年は書かない\n\
- ランキング形式・「〇選」・星評価や点数は禁止\n\
- 誇張表現や宣伝文句（「革命的」「最強」「今すぐダウンロード」など）は禁止\n\
- プレースホルダー、TODO、未完成のセクションを残さない",
        min = input.profile.min_len.unwrap_or_default(),
        code = input.profile.min_code_blocks.unwrap_or(0),
        year = input.today.year(),
    )
}

fn qiita_article(input: &PromptInput<'_>) -> (String, String) {
    let role = format!(
        "あなたは日本語の技術ブログライターです。Qiitaに投稿する技術記事を書いてください。\n\n{angle}{rules}\n- 1行目は必ず「{marker} 記事のタイトル」、2行目は空行、3行目から本文{exclusion}",
        angle = angle_block(input.angle),
        rules = japanese_rules(input),
        marker = TITLE_MARKER,
        exclusion = title_exclusion(input.previous_titles),
    );
    let task = format!(
        "以下のプロジェクト情報をもとに、Qiita向け技術記事を1本書いてください。\n\n{context}\n技術スタック: {stack}\n\n1行目は必ず「{marker} 記事のタイトル」としてください。",
        context = project_context_full(input.entity, Locale::Ja),
        stack = input.entity.tech_stack.join(", "),
        marker = TITLE_MARKER,
    );
    (role, task)
}

fn zenn_article(input: &PromptInput<'_>) -> (String, String) {
    let topics = tags_for(Platform::Zenn, input.entity)
        .iter()
        .map(|t| format!("\"{t}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let role = format!(
        "あなたは日本語の技術ブログライターです。Zennに投稿する技術記事を書いてください。\n\n{angle}{rules}\n- Zennのフロントマター形式で始める{exclusion}",
        angle = angle_block(input.angle),
        rules = japanese_rules(input),
        exclusion = title_exclusion(input.previous_titles),
    );
    let task = format!(
        "以下のプロジェクト情報をもとに、技術記事を1本書いてください。\n\n{context}\n技術スタック: {stack}\n\n記事は次のフロントマターで始めてください:\n---\ntitle: \"記事タイトル\"\nemoji: \"適切な絵文字\"\ntype: \"tech\"\ntopics: [{topics}]\npublished: true\n---\n\n技術選定の理由、実装のポイント、工夫した点を中心に書いてください。",
        context = project_context_full(input.entity, Locale::Ja),
        stack = input.entity.tech_stack.join(", "),
    );
    (role, task)
}

fn blog_post(input: &PromptInput<'_>) -> (String, String) {
    let tags = tags_for(Platform::Blog, input.entity)
        .iter()
        .map(|t| format!("\"{t}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let role = format!(
        "あなたは個人開発者のブログライターです。ポートフォリオサイトのブログ記事を書いてください。\n\n{rules}\n- MDXフロントマター形式で始める\n- 技術的な内容と開発ストーリーを含める{exclusion}",
        rules = japanese_rules(input),
        exclusion = title_exclusion(input.previous_titles),
    );
    let task = format!(
        "以下のプロジェクトについてブログ記事を書いてください。\n\n{context}\n\n次のフロントマターで始めてください:\n---\ntitle: \"英語タイトル\"\ntitleJa: \"日本語タイトル\"\nslug: \"{slug}-{stamp}\"\ndate: \"{date}\"\ntags: [{tags}]\ndescription: \"英語説明\"\ndescriptionJa: \"日本語説明\"\nproject: \"{slug}\"\npublished: true\n---\n\nフロントマターの後に記事本文を書いてください。",
        context = project_context_full(input.entity, Locale::Ja),
        slug = input.entity.slug,
        date = input.today.format("%Y-%m-%d"),
        stamp = input.today.format("%Y%m%d"),
    );
    (role, task)
}

fn community_post(input: &PromptInput<'_>) -> (String, String) {
    let subreddit = input.destination.unwrap_or("sideproject");
    let role = format!(
        "You are a member of the r/{subreddit} community. Write a post sharing your genuine experience, something that contributes to the community rather than promoting a product.\n\n\
Subreddit-specific guidance:\n{guidance}\n\n\
Absolute rules:\n\
- You are a community member, NOT a marketer\n\
- NO promotional language (\"check it out\", \"try it\", \"download\", \"sign up\")\n\
- The post must be valuable to readers even if they never use your tool\n\
- English only, 500-1000 words (at least {min} characters)\n\
- Do NOT include links anywhere in the post\n\
- Use {year} for any year references\n\
- First line: \"{marker} post title\"; second line empty; post body from the third line\n\
{bans}\n\n\
Structure the post as: a problem or question relevant to this community; what you experienced or discovered; what worked and what didn't; questions that invite genuine discussion.{exclusion}",
        guidance = subreddit_guidance(subreddit),
        min = input.profile.min_len.unwrap_or_default(),
        year = input.today.year(),
        marker = TITLE_MARKER,
        bans = SHARED_BANS,
        exclusion = title_exclusion(input.previous_titles),
    );
    let task = format!(
        "Think about what would be a genuinely interesting discussion topic for r/{subreddit}. Write a post based on the experience of building or using the project below.\n\n{context}\n\nFirst line must be \"{marker} post title\".",
        context = project_context_full(input.entity, Locale::En),
        marker = TITLE_MARKER,
    );
    (role, task)
}

fn short_post(input: &PromptInput<'_>) -> (String, String) {
    let platform = input.profile.platform;
    let limit = input.profile.max_len.unwrap_or_default();
    let hashtags = if platform == Platform::Twitter {
        "- Include 1 to 3 hashtags drawn from the hashtag candidates\n"
    } else {
        "- Hashtags are optional; at most 2\n"
    };
    let link = if input.profile.allow_links {
        input
            .entity
            .primary_url()
            .map(|u| format!("- You may end with this link: {u}\n"))
            .unwrap_or_default()
    } else {
        String::new()
    };
    let role = format!(
        "You are an indie developer talking to peers on {platform}. You share what happened while building something, the way a colleague would over coffee.\n\n\
{angle}Rules:\n\
- At most {limit} {unit}, counting everything including hashtags and links\n\
- Peer voice: never name programming languages, frameworks, libraries or hosting services\n\
- Use {year} for any year references\n\
{hashtags}{link}{bans}\n\
- Output only the post text. If you write alternatives, separate them with a line containing only {delimiter}",
        angle = input
            .angle
            .map(|a| format!("Post angle: {}\n{}\n\n", a.label, a.instruction))
            .unwrap_or_default(),
        unit = input.profile.length_unit.name(),
        year = input.today.year(),
        bans = SHARED_BANS,
        delimiter = VARIANT_DELIMITER,
    );
    let task = format!(
        "Write one {platform} post about the project below.\n\n{}",
        project_context_short(input.entity)
    );
    (role, task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angles::ARTICLE_ANGLES;
    use crate::platforms::profile_for;
    use syndic_state::Feature;

    fn entity() -> Entity {
        Entity {
            slug: "alpha".into(),
            name: "Alpha".into(),
            name_ja: Some("アルファ".into()),
            tagline: "Fast notes".into(),
            tech_stack: vec!["Rust".into(), "SvelteKit".into()],
            features: vec![Feature {
                title: "Sync".into(),
                description: "Syncs everywhere".into(),
                ..Feature::default()
            }],
            live_url: Some("https://alpha.test".into()),
            ..Entity::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn source_notes_section_is_empty_without_notes() {
        assert_eq!(source_notes_section(None), "");
        assert_eq!(source_notes_section(Some(&SourceNotes::default())), "");
        let notes = SourceNotes {
            metrics: vec!["p95 went from 900ms to 120ms".into()],
            ..SourceNotes::default()
        };
        let section = source_notes_section(Some(&notes));
        assert!(section.contains("[Measured data]\n- p95 went from 900ms to 120ms"));
        assert!(!section.contains("[Experiences]"));
    }

    #[test]
    fn short_context_omits_tech_stack() {
        let ctx = project_context_short(&entity());
        assert!(!ctx.contains("SvelteKit"));
        assert!(ctx.contains("Fast notes"));
    }

    #[test]
    fn japanese_context_prefers_localized_fields() {
        assert!(project_context_full(&entity(), Locale::Ja).starts_with("Name: アルファ"));
        assert!(project_context_full(&entity(), Locale::En).starts_with("Name: Alpha"));
    }

    #[test]
    fn article_request_carries_angle_year_titles_and_blog_link() {
        let e = entity();
        let profile = profile_for(Platform::Devto);
        let previous = vec!["An old title".to_string()];
        let req = build_request(&PromptInput {
            entity: &e,
            profile: &profile,
            angle: Some(&ARTICLE_ANGLES[1]),
            destination: None,
            previous_titles: &previous,
            today: today(),
            site_url: Some("https://hub.test/"),
        });
        assert!(req.role_instruction.contains("What I Learned"));
        assert!(req.role_instruction.contains("Use 2026"));
        assert!(req.role_instruction.contains("- An old title"));
        assert!(req.task_instruction.contains("https://hub.test/blog/alpha-guide/"));
        assert_eq!(req.purpose, "devto article (what-i-learned)");
    }

    #[test]
    fn community_request_names_the_subreddit() {
        let e = entity();
        let profile = profile_for(Platform::Reddit);
        let req = build_request(&PromptInput {
            entity: &e,
            profile: &profile,
            angle: None,
            destination: Some("webdev"),
            previous_titles: &[],
            today: today(),
            site_url: None,
        });
        assert!(req.role_instruction.contains("r/webdev"));
        assert!(req.role_instruction.contains("Do NOT include links"));
        assert_eq!(req.purpose, "reddit post (r/webdev)");
    }
}

//! Prompt text sent to the language model.

pub const PAGE_TYPE_SYSTEM: &str = r#"You are a web content analyst. Classify a web page based on its cleaned text content.
Possible classifications:
- BLOG_INDEX: Lists multiple dated news/blog articles (titles/excerpts, pagination, categories). Not a single post.
- RESOURCES_MIX: A hub that mixes articles with whitepapers/case studies/videos.
- SINGLE_ARTICLE: The full content of one article/post.
- PRODUCT_PAGE: Describes a product/service.
- OTHER: Anything else (contact/about/landing/pricing/etc.).

Rules:
- Prefer BLOG_INDEX only for section root pages (e.g., /blog, /community-blog, /resources), not individual articles.
- If unsure between BLOG_INDEX and RESOURCES_MIX, pick RESOURCES_MIX.
- Keep the answer short and objective.

Return ONLY JSON with: {"page_type": "...", "reason": "..."}"#;

pub const INDEX_LINKS_SYSTEM: &str = "You are an expert web navigator. Given a site's base URL and a list of internal links (with anchor text), return only the root section URLs that likely serve as indexes for blog/news/resources articles. Output JSON with 'urls'.";

pub fn index_links_user(base_url: &str, links: &[String]) -> String {
    format!(
        "Base URL: {}\n\nLinks (text -> url):\n{}\n\nReturn ONLY JSON: {{\"urls\": [\"...\"]}}",
        base_url,
        links.join("\n")
    )
}

pub const DATE_SELECTOR_SYSTEM: &str = "You are an expert in web scraping. Your task is to find the most reliable CSS selector for the publication date of an article given its HTML content. The selector should be specific enough to avoid other dates. Prioritize selectors with attributes like `[itemprop='datePublished']`, `[property='article:published_time']`, or classes/IDs related to 'date', 'published', 'meta'. If no reliable selector can be found, return null.";

pub fn date_selector_user(url: &str, snippet: &str) -> String {
    format!(
        "Article URL: {}\nHTML Body (cleaned):\n{}\n\nReturn ONLY JSON: {{\"selector\": \"<css selector or null>\"}}",
        url, snippet
    )
}

pub const TWEET_SYSTEM: &str = "You are an AI assistant that analyzes tweets to determine whether they are actionable for a specific business user.";

pub const TWEET_INSTRUCTIONS: &str = r#"Step 1 - Decide if the tweet is actionable for this specific user. A tweet is actionable if it relates to any of the user's industries, products, services, goals, ICP or clear business opportunities.

Step 2 - If actionable, answer:
- A short description of the tweet (max 50 chars)
- What is the business relevance of this tweet? (max 100 chars)
- What is the suggested action? (e.g. "Contact client")
- A concise reply tweet (<280 chars, informal, no email greetings)
- A priority level: "high", "medium" or "low". Use "neutral" when not actionable.

Respond only with a JSON object like this (no markdown, no extra keys):
{
  "short_description": "...",
  "actionable": true | false,
  "priority_level": "high" | "medium" | "low" | "neutral",
  "relevance": "...",
  "suggested_action": "...",
  "suggested_reply": "..."
}"#;

pub fn tweet_user(tweet_text: &str, profile: Option<&str>, context: &str) -> String {
    let mut prompt = String::from(TWEET_INSTRUCTIONS);
    if let Some(profile) = profile {
        prompt.push_str("\n\nUser profile (JSON):\n");
        prompt.push_str(profile);
    }
    if !context.is_empty() {
        prompt.push_str("\n\nRecent client context:\n");
        prompt.push_str(context);
    }
    prompt.push_str(&format!("\n\nTweet: \"{}\"", tweet_text));
    prompt
}

pub const EMAIL_SYSTEM: &str = r#"You are an intelligent email processor for business use. Classify each incoming email into one and only one of the following categories, based on the overall meaning and context of the message:
  "Actionable": asks the user to take a specific action such as confirming, approving, scheduling, replying, or addressing an issue.
  "Informative": provides information without requiring action (updates, announcements, reports, notifications).
  "Invoice": relates to a financial transaction (invoice, bill, payment, due date, receipt).
  "Contract": discusses a formal agreement, legal terms, signatures or clauses.
  "Promo": promotes products, services, or discounts.

Choose the single most relevant category.
Add a description of the content of the e-mail of at most 50 characters.
An email is actionable if it pertains to business opportunities, product announcements, customer engagement, market signals, or collaboration.
If the email is actionable, provide a suggested action (max 40 characters), a brief explanation of why it is relevant (max 100 characters) and a short professional reply.
If the email is not actionable, set suggested_action, relevance and suggested_reply to empty strings.

Return only JSON in this format:
{
  "category": "Actionable",
  "short_description": "A complaint from a customer",
  "actionable": true,
  "suggested_action": "View invoice.",
  "relevance": "Contract changes might risk project delays if not followed up promptly.",
  "suggested_reply": "..."
}"#;

pub const ITEM_SYSTEM: &str = r#"You are a highly efficient AI assistant specialized in analyzing business communications.

Your task is to process a single item (email, tweet, article), decide if it is actionable, and assign a priority.
An item is actionable if it represents a clear business opportunity, a reputational risk, a direct request, or a significant update that requires a specific action.

Actionability Priority Levels:
- high: Urgent matters. Direct business opportunities, critical reputational risks, requests with a clear deadline.
- medium: Important but not urgent. Non-critical client requests, opportunities needing timely follow-up.
- low: Requires monitoring. General updates, relationship-building notes, non-urgent acknowledgments.
- neutral: Not actionable.

OUTPUT FORMAT (STRICT): return ONE valid JSON object and nothing else, no code fences.
{
  "original_item": object,
  "analysis": {
    "short_description": string,     // max 50 chars
    "actionable": boolean,
    "priority_level": "high" | "medium" | "low" | "neutral",
    "opportunity_type": string,
    "suggested_action": string,
    "relevance": string,             // max 100 chars
    "suggested_reply": string
  }
}

If the item is NOT actionable (generic newsletter, status update with no required action, irrelevant marketing) return an empty JSON object {}."#;

pub fn item_user(profile: &str, rag_context: &str, item: &str) -> String {
    format!(
        "User Profile & Goals (JSON):\n{}\n\nContext from Past Interactions (RAG):\n{}\n\nItem to Analyze (JSON Object):\n{}",
        profile, rag_context, item
    )
}

/// Reply used whenever the model cannot produce one.
pub const REPLY_FALLBACK: &str = "Thank you for sharing your thoughts!";

pub fn reply_user(tweet_text: &str) -> String {
    format!(
        "You are a helpful AI assistant that writes thoughtful, concise Twitter replies.\nTweet: \"{}\"\nReply:",
        tweet_text
    )
}

pub const ARTICLE_SYSTEM: &str = r#"You are an AI assistant that analyzes business articles and extracts structured insights.

Your task is to return a valid JSON object with the following fields:
- "short_description": string (max 6 words)
- "actionable": boolean (true or false)
- "opportunity_type": string (e.g. "New business opportunity")
- "suggested_action": string (e.g. "Contact client", "Send proposal", "Schedule meeting")
- "relevance": string (max 100 characters, required only if actionable is true)

Use only double quotes in JSON. Respond only with the JSON object, without explanations, comments or markdown."#;

const ARTICLE_FORMAT: &str = r#"Respond ONLY with a JSON object in this format (no markdown, no comments):
{
  "short_description": "...",
  "actionable": true | false,
  "opportunity_type": "...",
  "suggested_action": "...",
  "relevance": "..."
}"#;

/// Cap on the article body sent for classification.
pub const ARTICLE_CONTENT_LIMIT: usize = 3_000;

pub fn article_user(title: &str, content: &str, profile: Option<&str>, context: &str) -> String {
    let mut prompt = format!(
        "Analyze the following article.\n\nTitle: {}\n\nContent:\n{}",
        title,
        ag_core::classification::truncate_chars(content, ARTICLE_CONTENT_LIMIT)
    );
    if let Some(profile) = profile {
        prompt.push_str("\n\nUser profile (JSON):\n");
        prompt.push_str(profile);
    }
    if !context.is_empty() {
        prompt.push_str("\n\nRecent client context:\n");
        prompt.push_str(context);
    }
    prompt.push_str("\n\n");
    prompt.push_str(ARTICLE_FORMAT);
    prompt
}

//! Prompt templates for the stylist model.

use crate::domain::model::{Garment, QueryRequirements, UserProfile};

pub const STYLIST_SYSTEM_PROMPT: &str = "You are an expert fashion stylist with years of experience helping clients find their perfect look. \
You understand body types, color theory, and how to dress for different occasions. \
Analyze the client's characteristics and preferences, consider the occasion and the style they want, \
pick the best options from what is available, explain your reasoning in a friendly way and give practical tips to complete the look. \
Be encouraging and positive while being honest about what works best.";

pub const USER_ANALYSIS_PROMPT: &str = r#"Analyze this person's photo and extract the following information.
Look carefully at their physical characteristics and any visible clothing.

Extract:
1. Body shape: slim / average / athletic / plus-size
2. Skin tone: fair / medium / tan / dark
3. Apparent gender: male / female / neutral
4. Current outfit style (if visible): describe briefly

Return ONLY a valid JSON object with no additional text:
{
    "body_shape": "...",
    "skin_tone": "...",
    "gender": "...",
    "current_style": "..."
}
"#;

pub const GARMENT_CLASSIFICATION_PROMPT: &str = r#"Analyze this garment image and classify it.

Determine:
1. Category: is this garment for the upper body (tops), lower body (bottoms), or a full-body piece (one-pieces)?
   - tops: shirts, t-shirts, blouses, sweaters, jackets, coats, vests
   - bottoms: pants, jeans, shorts, skirts
   - one-pieces: dresses, jumpsuits, rompers, overalls

2. Photo type: is this a model photo (worn by a person) or a flat-lay (product shot on plain background)?
   - model: garment is being worn by a person
   - flat-lay: garment is laid flat or on a mannequin/hanger

Return ONLY a valid JSON object with no additional text:
{
    "category": "tops" | "bottoms" | "one-pieces",
    "photo_type": "model" | "flat-lay",
    "description": "brief description of the garment"
}
"#;

/// `"a, b"` or `"any"` for an empty list.
pub fn join_or_any(values: &[String]) -> String {
    if values.is_empty() {
        "any".to_string()
    } else {
        values.join(", ")
    }
}

pub fn query_analysis(query: &str) -> String {
    format!(
        r#"Analyze this fashion request and extract the key requirements.

User request: {query}

Extract:
1. Desired style: casual / formal / vintage / streetwear / minimalist / bohemian / preppy / athletic / other
2. Occasion: work / party / date / travel / daily / wedding / interview / gym / beach / other
3. Weather hints: hot / cold / mild / rainy / not specified
4. Specific items mentioned: list any specific garment types (e.g., dress, jeans, blazer)
5. Color preferences: any colors mentioned
6. Budget hints: luxury / affordable / not specified

Return ONLY a valid JSON object with no additional text:
{{
    "style": "...",
    "occasion": "...",
    "weather": "...",
    "items": [...],
    "colors": [...],
    "budget": "..."
}}
"#
    )
}

pub fn search_keywords(profile: &UserProfile, requirements: &QueryRequirements) -> String {
    format!(
        r#"Based on the user profile and their fashion request, generate search keywords for finding clothes online.
Search for tops and bottoms separately so they can be combined into outfits.

User Profile:
- Body shape: {body_shape}
- Skin tone: {skin_tone}
- Gender: {gender}

Fashion Request:
- Style: {style}
- Occasion: {occasion}
- Weather: {weather}
- Specific items: {items}
- Color preferences: {colors}

Generate 2-3 keyword combinations for TOPS (shirts, blouses, sweaters, jackets)
and 2-3 keyword combinations for BOTTOMS (pants, jeans, skirts, shorts).
Consider colors that complement the user's skin tone.
Consider styles that flatter the user's body shape.

Return ONLY a valid JSON object with no additional text:
{{
    "tops_keywords": ["keyword combination 1", "keyword combination 2"],
    "bottoms_keywords": ["keyword combination 1", "keyword combination 2"],
    "recommended_colors": ["color1", "color2"],
    "reasoning": "brief explanation of why these keywords were chosen"
}}
"#,
        body_shape = profile.body_shape,
        skin_tone = profile.skin_tone,
        gender = profile.gender,
        style = requirements.style,
        occasion = requirements.occasion,
        weather = requirements.weather,
        items = join_or_any(&requirements.items),
        colors = join_or_any(&requirements.colors),
    )
}

fn garment_list(garments: &[Garment]) -> String {
    garments
        .iter()
        .enumerate()
        .map(|(i, garment)| {
            let mut line = format!("{}: {}", i, non_empty_or(&garment.hit.title, "Unknown"));
            if !garment.hit.snippet.is_empty() {
                let snippet: String = garment.hit.snippet.chars().take(160).collect();
                line.push_str(&format!(" - {}", snippet));
            }
            if let Some(price) = &garment.hit.price {
                line.push_str(&format!(" ({})", price));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

pub fn outfit_pairing(
    tops: &[Garment],
    bottoms: &[Garment],
    profile: &UserProfile,
    requirements: &QueryRequirements,
    num_sets: usize,
) -> String {
    format!(
        r#"As a professional fashion stylist, recommend the best outfit combinations (pairings of tops and bottoms).

User Profile:
- Body shape: {body_shape}
- Skin tone: {skin_tone}
- Gender: {gender}

Requirements:
- Style: {style}
- Occasion: {occasion}

Available TOPS (with index):
{tops_list}

Available BOTTOMS (with index):
{bottoms_list}

Create {num_sets} outfit sets by pairing tops with bottoms. Consider:
1. Color coordination - complementary or harmonious colors
2. Style consistency - pieces that work together aesthetically
3. Occasion appropriateness - suitable for the event/setting
4. Body flattery - combinations that enhance the user's figure

Return ONLY a valid JSON object with no additional text:
{{
    "outfit_sets": [
        {{
            "top_index": 0,
            "bottom_index": 2,
            "reasoning": "2 sentences explaining why this combination works well for the user"
        }}
    ],
    "overall_styling_tips": "1-2 tips for completing these looks with accessories"
}}
"#,
        body_shape = profile.body_shape,
        skin_tone = profile.skin_tone,
        gender = profile.gender,
        style = requirements.style,
        occasion = requirements.occasion,
        tops_list = garment_list(tops),
        bottoms_list = garment_list(bottoms),
    )
}

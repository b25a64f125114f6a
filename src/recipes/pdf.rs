//! Recipe export as a PDF document.
//!
//! [`layout`] turns a recipe into styled text blocks; [`render`] flows those
//! blocks onto A4 pages with the built-in Helvetica faces.

use anyhow::anyhow;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument};

use crate::recipes::repo_types::{Nutrition, Recipe, RecipeDetails, RecipeIngredientLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Title,
    Byline,
    Heading,
    Body,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub style: Style,
    pub text: String,
}

impl Block {
    fn new(style: Style, text: impl Into<String>) -> Self {
        Self {
            style,
            text: text.into(),
        }
    }
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

pub fn summary_line(recipe: &Recipe) -> String {
    format!(
        "Prep: {} min  |  Cook: {} min  |  Servings: {}  |  Difficulty: {}",
        or_dash(recipe.prep_time_minutes),
        or_dash(recipe.cook_time_minutes),
        or_dash(recipe.serving_size),
        or_dash(recipe.difficulty_level),
    )
}

/// "quantity unit name (notes)", skipping the parts that are missing.
pub fn ingredient_line(line: &RecipeIngredientLine) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(3);
    parts.extend(line.quantity.as_deref());
    parts.extend(line.unit.as_deref());
    parts.push(&line.ingredient_name);
    let mut text = format!("- {}", parts.join(" "));
    if let Some(notes) = line.notes.as_deref() {
        text.push_str(&format!(" ({notes})"));
    }
    text
}

pub fn nutrition_lines(n: &Nutrition) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(v) = n.calories {
        lines.push(format!("Calories: {v} kcal"));
    }
    let grams = [
        ("Protein", n.protein),
        ("Carbs", n.carbs),
        ("Fat", n.fat),
        ("Fiber", n.fiber),
        ("Sugar", n.sugar),
    ];
    for (label, value) in grams {
        if let Some(v) = value {
            lines.push(format!("{label}: {v} g"));
        }
    }
    if let Some(v) = n.sodium {
        lines.push(format!("Sodium: {v} mg"));
    }
    lines
}

pub fn layout(details: &RecipeDetails) -> Vec<Block> {
    let recipe = &details.recipe;
    let mut blocks = vec![
        Block::new(Style::Title, recipe.title.clone()),
        Block::new(Style::Byline, format!("By {}", details.author_username)),
        Block::new(Style::Body, summary_line(recipe)),
    ];

    if let Some(description) = recipe.description.as_deref() {
        blocks.push(Block::new(Style::Heading, "Description"));
        blocks.push(Block::new(Style::Body, description));
    }

    if !details.ingredients.is_empty() {
        blocks.push(Block::new(Style::Heading, "Ingredients"));
        blocks.extend(
            details
                .ingredients
                .iter()
                .map(|l| Block::new(Style::Body, ingredient_line(l))),
        );
    }

    blocks.push(Block::new(Style::Heading, "Instructions"));
    blocks.push(Block::new(Style::Body, recipe.instructions.clone()));

    let nutrition = nutrition_lines(&recipe.nutrition);
    if !nutrition.is_empty() {
        blocks.push(Block::new(Style::Heading, "Nutrition Facts"));
        blocks.extend(nutrition.into_iter().map(|l| Block::new(Style::Body, l)));
    }
    blocks
}

/// Greedy word wrap. Keeps explicit newlines, hard-splits overlong words.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut out = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if !line.is_empty() {
                    out.push(std::mem::take(&mut line));
                }
                out.push(word.drain(..max_chars).collect());
            }
            let word: String = word.into_iter().collect();
            if word.is_empty() {
                continue;
            }
            let needed = line.chars().count() + usize::from(!line.is_empty()) + word.chars().count();
            if needed > max_chars && !line.is_empty() {
                out.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        out.push(line);
    }
    out
}

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const PT_TO_MM: f32 = 0.3528;

pub fn render(title: &str, blocks: &[Block]) -> anyhow::Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "content");
    let font = |builtin: BuiltinFont| {
        doc.add_builtin_font(builtin)
            .map_err(|e| anyhow!("loading builtin font: {e:?}"))
    };
    let regular = font(BuiltinFont::Helvetica)?;
    let bold = font(BuiltinFont::HelveticaBold)?;
    let italic = font(BuiltinFont::HelveticaOblique)?;

    let mut current = doc.get_page(page).get_layer(layer);
    let mut y = PAGE_HEIGHT - MARGIN;
    for block in blocks {
        let (size, face): (f32, &IndirectFontRef) = match block.style {
            Style::Title => (22.0, &bold),
            Style::Byline => (11.0, &italic),
            Style::Heading => (14.0, &bold),
            Style::Body => (11.0, &regular),
        };
        let line_height = size * PT_TO_MM * 1.4;
        // Helvetica averages about half an em per glyph.
        let max_chars = ((PAGE_WIDTH - 2.0 * MARGIN) / (size * PT_TO_MM * 0.5)) as usize;
        if block.style == Style::Heading {
            y -= line_height * 0.6;
        }
        for line in wrap(&block.text, max_chars) {
            if y - line_height < MARGIN {
                let (next_page, next_layer) =
                    doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "content");
                current = doc.get_page(next_page).get_layer(next_layer);
                y = PAGE_HEIGHT - MARGIN;
            }
            y -= line_height;
            current.use_text(line, size, Mm(MARGIN), Mm(y), face);
        }
    }

    doc.save_to_bytes()
        .map_err(|e| anyhow!("serializing pdf: {e:?}"))
}

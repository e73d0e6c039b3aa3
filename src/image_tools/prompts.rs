//! Prompt text for the image tools.

pub const PERSON_FALLBACK: &str = "a happy person";

pub const DESCRIBE_PERSON: &str = "\
Describe the physical appearance of the person in this image specifically for creating a cute, kawaii cartoon avatar.
Focus on:
1. Gender and approximate age group (e.g., young boy, woman).
2. Hair color, length, and style.
3. Eye color (if visible) and glasses (if worn).
4. Facial hair (if any).
5. Distinctive features (e.g., freckles, hat).

Keep the description concise and descriptive (e.g., \"a young woman with long brown hair and round glasses\").
Do not describe the clothing or background.";

pub fn holiday_scene(interest: &str) -> String {
    format!(
        "Generate a cozy, festive holiday scene as a cute, kawaii, cartoon-style 3D render.
The scene should celebrate the user's interest: {interest}.
Weave the interest into the decorations, props and setting (ornaments, gifts, snow sculptures).
Include a decorated Christmas tree, warm string lights and gentle falling snow.
Leave open space in the center foreground where a character could stand.
Do NOT include any people or characters in the scene."
    )
}

pub fn sweater_pattern(motif: &str) -> String {
    format!(
        "Design a seamless, tileable \"ugly holiday sweater\" pattern.
The design should mimic a knitted wool texture with visible stitching details.
Use a chaotic but festive color palette (reds, greens, whites, golds).
The main motif on the design should be: {motif}

View: Top-down, flat 2D texture map.
Do NOT show a shirt, a model, or folds. Show ONLY the rectangular pattern design."
    )
}

pub fn wearing_sweater(person_description: &str) -> String {
    format!(
        "Generate a cute, kawaii, cartoon-style 3D render of {person_description} wearing a knitted sweater.

Sweater Pattern: Use the pattern in the attached image.

Style:
- Cute, chibi, or cartoon aesthetic.
- Bright, cheerful colors.
- Soft lighting, high fidelity 3D render (like a high-quality toy or animation character).
- The character should be facing the camera and smiling.
- The character should resemble the description: {person_description}

Background: Simple, festive, or winter-themed background that complements the character."
    )
}

pub const FINAL_PHOTO: &str = "\
Create a festive holiday photo by placing the character from the attached character image into the attached holiday scene.
Keep the character's appearance and sweater exactly as shown, and keep the scene's decorations and style.
The character should stand in the center foreground, smiling at the camera, lit consistently with the scene.
The result should look like a single cohesive cute, kawaii, cartoon-style 3D render, like a holiday card.";

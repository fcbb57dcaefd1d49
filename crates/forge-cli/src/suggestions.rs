use crate::app::EditorMode;

const PHOTO: &[&str] = &[
    "Transform into a detailed Japanese Ukiyo-e woodblock print",
    "Reimagine this as a colorful fauvist painting",
    "Apply a pop-art effect with bold outlines and vibrant colors",
    "Make it look like a delicate watercolor sketch",
    "Give it a dramatic, film noir look with deep shadows and high contrast",
    "Drench the scene in neon-noir, cyberpunk city lights",
    "Add a moody, atmospheric fog or mist",
    "Surround the subject with magical, glowing particles",
    "Place the scene on a fantastical alien planet with two moons",
    "Apply a faded, 1970s polaroid photo effect",
    "Give it a grainy, sepia-toned old-timey photo look",
    "Add a glitchy, 80s VHS tape aesthetic",
];

const VIDEO: &[&str] = &[
    "An epic cinematic shot of a car driving through a neon-lit city at night",
    "A time-lapse of a flower blooming in hyper-detail",
    "A cute, animated character waving hello",
    "A drone shot flying over a majestic mountain range at sunrise",
    "Slow motion shot of a single drop of rain hitting a puddle",
    "A futuristic robot assembling a complex device",
    "A cozy, crackling fireplace scene, looping",
    "A magical portal opening up in a forest",
    "A fleet of spaceships flying through an asteroid field",
    "An abstract animation of flowing liquid colors",
    "A chef expertly tossing a pizza in the air, slow motion",
    "A time-lapse of clouds moving across the sky",
];

const GENERATION: &[&str] = &[
    "A hyper-realistic photo of a cat astronaut on the moon",
    "A surreal oil painting of a whale swimming in a cloudy sky",
    "A logo for a coffee shop named \"The Starship Brew\"",
    "Pixel art of a fantasy castle on a floating island",
    "A cinematic 8k photo of a futuristic cyberpunk city in the rain",
    "A watercolor illustration of a fox reading a book in a forest",
    "A 3D render of a delicious, colorful donut with sprinkles",
    "A vintage travel poster for a trip to Mars",
    "An abstract pattern of geometric shapes in pastel colors",
    "A detailed vector illustration of a robotic hummingbird",
    "A cute sticker of a smiling avocado with sunglasses",
    "A dramatic concept art of a knight facing a dragon",
];

/// Shown in turn while a video job runs.
pub const LOADING_MESSAGES: &[&str] = &[
    "Generating your video...",
    "This can take over a minute on the free service...",
    "The AI model might be warming up...",
    "Thanks for your patience...",
];

pub fn for_mode(mode: EditorMode) -> &'static [&'static str] {
    match mode {
        EditorMode::Photo => PHOTO,
        EditorMode::Generation => GENERATION,
        EditorMode::Video => VIDEO,
    }
}

pub fn loading_message(ticks: usize) -> &'static str {
    LOADING_MESSAGES[ticks % LOADING_MESSAGES.len()]
}

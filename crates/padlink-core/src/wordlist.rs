//! Fixed public wordlist backing the spoken mnemonic checksum.
//!
//! 256 short, phonetically distinct English words. The list is part of the
//! wire-compatibility surface: reordering or replacing entries changes the
//! mnemonic derived from existing pads, so the list is append-never and
//! edit-never once released.

/// The mnemonic wordlist. Index order is load-bearing.
pub const WORDS: [&str; 256] = [
    "acid", "acorn", "actor", "alarm", "album", "alley", "amber", "angle",
    "ankle", "apple", "apron", "arrow", "atlas", "attic", "axis", "bacon",
    "badge", "bagel", "banjo", "barn", "basil", "beach", "beak", "bean",
    "bear", "bell", "bench", "berry", "bike", "birch", "bison", "blade",
    "blush", "boat", "bolt", "bone", "book", "boot", "bottle", "bread",
    "brick", "bridge", "brook", "broom", "brush", "bucket", "bulb", "bunny",
    "cabin", "cable", "cactus", "cake", "camel", "candle", "canoe", "card",
    "cargo", "carrot", "castle", "cedar", "chain", "chalk", "cheese", "cherry",
    "chess", "chin", "cider", "circle", "claw", "clay", "cliff", "clock",
    "cloud", "clover", "coach", "coast", "cobra", "cocoa", "coin", "comet",
    "coral", "cotton", "cougar", "crane", "crater", "crayon", "creek", "crown",
    "cube", "cupid", "curtain", "daisy", "deer", "delta", "denim", "desk",
    "dial", "dime", "dolphin", "donkey", "door", "dragon", "drum", "duck",
    "eagle", "easel", "echo", "elbow", "elm", "ember", "engine", "fabric",
    "falcon", "fern", "ferry", "fiddle", "flag", "flame", "flute", "foam",
    "forest", "fossil", "fox", "frost", "gallon", "garden", "gecko", "gem",
    "ginger", "glacier", "globe", "glove", "goose", "gourd", "grape", "gravel",
    "guitar", "hammer", "harbor", "hawk", "hazel", "heron", "hill", "honey",
    "hook", "horn", "house", "husk", "igloo", "inch", "iris", "iron",
    "island", "ivory", "jade", "jaguar", "jar", "jelly", "jewel", "judge",
    "juice", "jungle", "kayak", "kettle", "king", "kite", "kiwi", "knight",
    "koala", "ladder", "lagoon", "lake", "lantern", "lark", "lava", "leaf",
    "lemon", "lentil", "lily", "lime", "lion", "lizard", "llama", "lobster",
    "locket", "lotus", "lunar", "magnet", "mango", "maple", "marble", "mask",
    "meadow", "melon", "mesa", "mint", "mirror", "moose", "moss", "moth",
    "mule", "mural", "napkin", "needle", "nest", "nickel", "north", "oak",
    "oasis", "ocean", "olive", "onion", "opal", "orbit", "orchid", "otter",
    "owl", "oyster", "panda", "pearl", "pebble", "pecan", "pelican", "penny",
    "pepper", "piano", "pigeon", "pine", "planet", "plum", "pond", "poppy",
    "prism", "pump", "quail", "quartz", "quill", "rabbit", "raft", "rain",
    "raven", "reef", "ridge", "river", "robin", "rocket", "rose", "ruby",
    "saddle", "sage", "salmon", "sand", "seal", "shell", "sierra", "spruce",
];

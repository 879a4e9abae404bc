use vbind_site::extractor::{tokens, ExtractorKind};
use vbind_site::{extract, Extractor, TailwindExtractor};

const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_:/";

fn in_alphabet(c: char) -> bool {
    ALPHABET.contains(c)
}

const SAMPLES: &[&str] = &[
    "",
    " ",
    "foo bar",
    "bg-red-500 text-white",
    "a::before",
    "<div class='px-4 py-2'>",
    "@tailwind base;\n@tailwind components;\n.btn { @apply px-4 py-2 rounded; }",
    "export default { computed: { classes() { return ['lg:w-1/3', this.dark && 'bg-gray-900'] } } }",
    "<template>\n  <g-link :to=\"post.path\" class=\"hover:underline\">{{ post.title }}</g-link>\n</template>",
    "ünïcödé — “quotes” and emoji 🎉 text-sm",
    "\u{0}\u{1}\t\r\n",
];

#[test]
fn test_documented_examples() {
    assert_eq!(extract(""), Vec::<String>::new());
    assert_eq!(extract("foo bar"), vec!["foo", "bar"]);
    assert_eq!(extract("bg-red-500 text-white"), vec!["bg-red-500", "text-white"]);
    assert_eq!(extract("a::before"), vec!["a::before"]);

    let markup = extract("<div class='px-4 py-2'>");
    for expected in ["div", "class", "px-4", "py-2"] {
        assert!(markup.iter().any(|t| t == expected), "missing {expected} in {markup:?}");
    }
}

#[test]
fn test_tokens_use_only_the_alphabet() {
    for sample in SAMPLES {
        for token in extract(sample) {
            assert!(!token.is_empty(), "empty token from {sample:?}");
            assert!(token.chars().all(in_alphabet), "bad token {token:?} from {sample:?}");
        }
    }
}

#[test]
fn test_tokens_are_maximal_runs() {
    for sample in SAMPLES {
        for m in tokens(sample) {
            let start = m.as_ptr() as usize - sample.as_ptr() as usize;
            let end = start + m.len();
            let before = sample[..start].chars().next_back();
            let after = sample[end..].chars().next();
            assert!(!before.is_some_and(in_alphabet), "{m:?} not maximal on the left in {sample:?}");
            assert!(!after.is_some_and(in_alphabet), "{m:?} not maximal on the right in {sample:?}");
        }
    }
}

#[test]
fn test_no_eligible_character_is_lost() {
    for sample in SAMPLES {
        let kept: usize = extract(sample).iter().map(|t| t.len()).sum();
        let eligible = sample.chars().filter(|&c| in_alphabet(c)).count();
        assert_eq!(kept, eligible, "characters dropped from {sample:?}");
    }
}

#[test]
fn test_order_follows_input_positions() {
    for sample in SAMPLES {
        let starts: Vec<usize> = tokens(sample)
            .map(|m| m.as_ptr() as usize - sample.as_ptr() as usize)
            .collect();
        assert!(starts.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn test_deterministic_across_threads() {
    let input = SAMPLES.join("\n");
    let expected = extract(&input);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let input = input.clone();
            std::thread::spawn(move || TailwindExtractor.extract(&input))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn test_extractor_kind_from_config_name() {
    let kind: ExtractorKind = serde_json::from_str("\"tailwind\"").unwrap();
    assert_eq!(kind, ExtractorKind::Tailwind);
    assert_eq!(kind.build().extract("w-full h-8"), vec!["w-full", "h-8"]);
}

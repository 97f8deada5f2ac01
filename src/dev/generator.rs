// src/dev/generator.rs
// Random script sources for the built-in grammar. `gen_valid_source` only
// emits text both engines accept; `gen_noisy_source` damages it on purpose.

use rand::Rng;

const MAX_DEPTH: usize = 3;

/// Valid source of at least `target_len` bytes (empty for 0).
pub fn gen_valid_source<R: Rng>(rng: &mut R, target_len: usize) -> String {
    let mut out = String::with_capacity(target_len + target_len / 8);
    while out.len() < target_len {
        push_statement(rng, &mut out, 0);
        push_sep(rng, &mut out);
    }
    out
}

/// Valid source with random chars deleted, duplicated or inserted.
pub fn gen_noisy_source<R: Rng>(rng: &mut R, target_len: usize) -> String {
    let clean = gen_valid_source(rng, target_len);
    let mut out = String::with_capacity(clean.len() + 16);
    for ch in clean.chars() {
        match rng.random_range(0u32..100) {
            0..=2 => {}
            3..=4 => {
                out.push(ch);
                out.push(ch);
            }
            5..=7 => {
                out.push(random_noise(rng));
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    if rng.random_bool(0.3) {
        out.push(random_noise(rng));
    }
    out
}

fn push_statement<R: Rng>(rng: &mut R, out: &mut String, depth: usize) {
    match rng.random_range(0u32..100) {
        // key <op> value
        0..=69 => {
            push_key(rng, out);
            push_sep(rng, out);
            push_specifier(rng, out);
            push_sep(rng, out);
            push_value(rng, out, depth);
        }
        // bare scalar (array element)
        70..=89 => push_scalar(rng, out),
        // bare block
        _ => push_block(rng, out, depth),
    }
}

fn push_value<R: Rng>(rng: &mut R, out: &mut String, depth: usize) {
    if depth < MAX_DEPTH && rng.random_bool(0.25) {
        push_block(rng, out, depth);
    } else {
        push_scalar(rng, out);
    }
}

fn push_block<R: Rng>(rng: &mut R, out: &mut String, depth: usize) {
    out.push('{');
    push_sep(rng, out);
    if depth < MAX_DEPTH {
        let n = rng.random_range(0..=4);
        for _ in 0..n {
            push_statement(rng, out, depth + 1);
            push_sep(rng, out);
        }
    }
    out.push('}');
}

fn push_key<R: Rng>(rng: &mut R, out: &mut String) {
    match rng.random_range(0u32..10) {
        0 => push_date(rng, out),
        1 => push_string(rng, out),
        _ => push_symbol(rng, out),
    }
}

fn push_scalar<R: Rng>(rng: &mut R, out: &mut String) {
    match rng.random_range(0u32..100) {
        0..=29 => push_symbol(rng, out),
        30..=54 => push_string(rng, out),
        55..=79 => push_integer(rng, out),
        80..=92 => push_real(rng, out),
        _ => push_date(rng, out),
    }
}

fn push_specifier<R: Rng>(rng: &mut R, out: &mut String) {
    const OPS: [&str; 7] = ["=", "=", "=", "<", ">", "<=", ">="];
    if rng.random_bool(0.05) {
        out.push_str(if rng.random_bool(0.5) { "==" } else { "!=" });
        return;
    }
    out.push_str(OPS[rng.random_range(0..OPS.len())]);
}

fn push_symbol<R: Rng>(rng: &mut R, out: &mut String) {
    const FIRST: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_@";
    const REST: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789_.:";
    out.push(FIRST[rng.random_range(0..FIRST.len())] as char);
    for _ in 0..rng.random_range(0..=10) {
        out.push(REST[rng.random_range(0..REST.len())] as char);
    }
}

fn push_digits<R: Rng>(rng: &mut R, out: &mut String, max: usize) {
    for _ in 0..rng.random_range(1..=max) {
        out.push(char::from(b'0' + rng.random_range(0..10u8)));
    }
}

fn push_integer<R: Rng>(rng: &mut R, out: &mut String) {
    if rng.random_bool(0.2) {
        out.push('-');
    }
    push_digits(rng, out, 9);
}

fn push_real<R: Rng>(rng: &mut R, out: &mut String) {
    if rng.random_bool(0.2) {
        out.push('-');
    }
    push_digits(rng, out, 5);
    out.push('.');
    push_digits(rng, out, 5);
}

fn push_date<R: Rng>(rng: &mut R, out: &mut String) {
    push_digits(rng, out, 4);
    out.push('.');
    push_digits(rng, out, 2);
    out.push('.');
    push_digits(rng, out, 2);
}

fn push_string<R: Rng>(rng: &mut R, out: &mut String) {
    const BODY: &[u8] = b"abcdefghij KLMNOP 0123456789 {}=#<>!-.,;:";
    out.push('"');
    for _ in 0..rng.random_range(0..=16) {
        match rng.random_range(0u32..40) {
            0 => out.push_str("\\\""),
            1 => out.push_str("\\\\"),
            2 => out.push('\n'),
            _ => out.push(BODY[rng.random_range(0..BODY.len())] as char),
        }
    }
    out.push('"');
}

/// At least one separator char, so adjacent tokens never merge.
fn push_sep<R: Rng>(rng: &mut R, out: &mut String) {
    const WS: [char; 4] = [' ', '\t', '\r', '\n'];
    if rng.random_bool(0.08) {
        out.push_str(" # ");
        for _ in 0..rng.random_range(0..=24) {
            out.push(char::from(b'a' + rng.random_range(0..26u8)));
        }
        out.push('\n');
        return;
    }
    for _ in 0..rng.random_range(1..=3) {
        out.push(WS[rng.random_range(0..WS.len())]);
    }
}

fn random_noise<R: Rng>(rng: &mut R) -> char {
    const NOISE: [char; 14] = [
        '"', '{', '}', '=', '!', '-', '.', '#', '\\', '$', '%', 'é', '\u{1F600}', '\0',
    ];
    NOISE[rng.random_range(0..NOISE.len())]
}

//! CCSDS (255,223) Reed-Solomon code in conventional (non dual-basis) representation.
//!
//! Symbols are bytes in GF(2^8) built from the field polynomial `0x187`. The generator has 32
//! consecutive roots `alpha^(11 * (112 + i))`, so up to 16 symbol errors per block are
//! corrected. Blocks shorter than 255 bytes are treated as shortened codewords whose missing
//! leading symbols are zero.

use crate::{FecError, MAX_FEC_LEN};

/// Parity symbols per block.
pub const PARITY_LEN: usize = 32;
/// Symbols in a full codeword.
pub const BLOCK_LEN: usize = MAX_FEC_LEN;
/// Largest number of data symbols in a block.
pub const MAX_DATA_LEN: usize = BLOCK_LEN - PARITY_LEN;

const NN: usize = BLOCK_LEN;
const GF_POLY: u16 = 0x187;
const FCR: usize = 112;
const PRIM: usize = 11;
// Multiplicative inverse of PRIM modulo NN
const IPRIM: usize = 116;
// Log of zero
const A0: u8 = NN as u8;

const fn modnn(x: usize) -> usize {
    x % NN
}

const fn gf_tables() -> ([u8; 256], [u8; 256]) {
    let mut alpha_to = [0u8; 256];
    let mut index_of = [0u8; 256];
    index_of[0] = A0;

    let mut sr: u16 = 1;
    let mut i = 0;
    while i < NN {
        index_of[sr as usize] = i as u8;
        alpha_to[i] = sr as u8;
        sr <<= 1;
        if sr & 0x100 != 0 {
            sr ^= GF_POLY;
        }
        i += 1;
    }

    (alpha_to, index_of)
}

const TABLES: ([u8; 256], [u8; 256]) = gf_tables();

/// Power to element. `ALPHA_TO[255]` is zero.
static ALPHA_TO: [u8; 256] = TABLES.0;
/// Element to power. `INDEX_OF[0]` is [`A0`].
static INDEX_OF: [u8; 256] = TABLES.1;

/// Generator polynomial coefficients in index form, lowest degree first.
const fn generator_poly() -> [u8; PARITY_LEN + 1] {
    let (alpha_to, index_of) = TABLES;
    let mut genpoly = [0u8; PARITY_LEN + 1];
    genpoly[0] = 1;

    let mut root = FCR * PRIM;
    let mut i = 0;
    while i < PARITY_LEN {
        genpoly[i + 1] = 1;
        // Multiply by (x + alpha^root)
        let mut j = i;
        while j > 0 {
            genpoly[j] = if genpoly[j] != 0 {
                genpoly[j - 1] ^ alpha_to[modnn(index_of[genpoly[j] as usize] as usize + root)]
            } else {
                genpoly[j - 1]
            };
            j -= 1;
        }
        genpoly[0] = alpha_to[modnn(index_of[genpoly[0] as usize] as usize + root)];
        root += PRIM;
        i += 1;
    }

    let mut i = 0;
    while i <= PARITY_LEN {
        genpoly[i] = index_of[genpoly[i] as usize];
        i += 1;
    }
    genpoly
}

static GENPOLY: [u8; PARITY_LEN + 1] = generator_poly();

#[inline]
fn alpha(power: usize) -> u8 {
    ALPHA_TO[modnn(power)]
}

#[inline]
fn index(element: u8) -> usize {
    INDEX_OF[element as usize] as usize
}

/// Virtual zero symbols in front of a shortened block of `block_len` symbols.
pub const fn pad_len(block_len: usize) -> usize {
    BLOCK_LEN.saturating_sub(block_len)
}

/// Computes the parity symbols for `data`.
///
/// `data` holds at most [`MAX_DATA_LEN`] symbols; the codeword is `data` followed by `parity`.
pub fn encode(data: &[u8], parity: &mut [u8; PARITY_LEN]) {
    debug_assert!(data.len() <= MAX_DATA_LEN);
    parity.fill(0);

    for &symbol in data {
        let feedback = INDEX_OF[(symbol ^ parity[0]) as usize];
        if feedback != A0 {
            let feedback = feedback as usize;
            for j in 1..PARITY_LEN {
                parity[j] ^= alpha(feedback + GENPOLY[PARITY_LEN - j] as usize);
            }
        }
        parity.copy_within(1.., 0);
        parity[PARITY_LEN - 1] = if feedback != A0 {
            alpha(feedback as usize + GENPOLY[0] as usize)
        } else {
            0
        };
    }
}

/// Corrects `block` (data followed by parity) in place.
///
/// Returns the number of symbols corrected, or `UncorrectableBlock` if the block has more
/// errors than the code can locate. An uncorrectable block is left untouched.
pub fn decode(block: &mut [u8]) -> Result<usize, FecError> {
    if block.len() > BLOCK_LEN {
        return Err(FecError::OversizedInput {
            len: block.len(),
            max: BLOCK_LEN,
        });
    }
    if block.len() < PARITY_LEN {
        return Err(FecError::TruncatedFrame {
            len: block.len(),
            min: PARITY_LEN,
        });
    }
    let pad = pad_len(block.len());

    // Syndromes: the received polynomial evaluated at each generator root
    let mut syndromes = [0u8; PARITY_LEN];
    for (i, s) in syndromes.iter_mut().enumerate() {
        let root = (FCR + i) * PRIM;
        *s = block.iter().fold(0u8, |acc, &symbol| {
            if acc == 0 {
                symbol
            } else {
                symbol ^ alpha(index(acc) + root)
            }
        });
    }
    if syndromes.iter().all(|&s| s == 0) {
        return Ok(0);
    }
    let syndromes = syndromes.map(|s| INDEX_OF[s as usize]);

    // Berlekamp-Massey: error locator lambda in poly form, b in index form
    let mut lambda = [0u8; PARITY_LEN + 1];
    lambda[0] = 1;
    let mut b = lambda.map(|l| INDEX_OF[l as usize]);
    let mut el = 0;

    for r in 1..=PARITY_LEN {
        let discr = (0..r)
            .filter(|&i| lambda[i] != 0 && syndromes[r - i - 1] != A0)
            .fold(0u8, |acc, i| {
                acc ^ alpha(index(lambda[i]) + syndromes[r - i - 1] as usize)
            });
        let discr = INDEX_OF[discr as usize];

        if discr == A0 {
            b.copy_within(..PARITY_LEN, 1);
            b[0] = A0;
            continue;
        }

        let mut t = [0u8; PARITY_LEN + 1];
        t[0] = lambda[0];
        for i in 0..PARITY_LEN {
            t[i + 1] = if b[i] != A0 {
                lambda[i + 1] ^ alpha(discr as usize + b[i] as usize)
            } else {
                lambda[i + 1]
            };
        }

        if 2 * el < r {
            el = r - el;
            for (bi, &li) in b.iter_mut().zip(lambda.iter()) {
                *bi = if li == 0 {
                    A0
                } else {
                    modnn(index(li) + NN - discr as usize) as u8
                };
            }
        } else {
            b.copy_within(..PARITY_LEN, 1);
            b[0] = A0;
        }
        lambda = t;
    }

    let lambda = lambda.map(|l| INDEX_OF[l as usize]);
    let deg_lambda = lambda.iter().rposition(|&l| l != A0).unwrap_or(0);
    if deg_lambda == 0 || 2 * deg_lambda > PARITY_LEN {
        return Err(FecError::UncorrectableBlock);
    }

    // Chien search for the roots of lambda
    let mut reg = lambda;
    let mut roots = [0usize; PARITY_LEN];
    let mut locations = [0usize; PARITY_LEN];
    let mut count = 0;
    let mut k = IPRIM - 1;
    for i in 1..=NN {
        let mut q = 1u8;
        for j in (1..=deg_lambda).rev() {
            if reg[j] != A0 {
                reg[j] = modnn(reg[j] as usize + j) as u8;
                q ^= ALPHA_TO[reg[j] as usize];
            }
        }
        if q == 0 {
            roots[count] = i;
            locations[count] = k;
            count += 1;
            if count == deg_lambda {
                break;
            }
        }
        k = modnn(k + IPRIM);
    }
    if count != deg_lambda {
        return Err(FecError::UncorrectableBlock);
    }
    let roots = &roots[..count];
    let locations = &locations[..count];
    if locations.iter().any(|&loc| loc < pad) {
        return Err(FecError::UncorrectableBlock);
    }

    // Error evaluator omega = syndromes * lambda mod x^PARITY_LEN, index form
    let deg_omega = deg_lambda - 1;
    let mut omega = [A0; PARITY_LEN + 1];
    for (i, o) in omega.iter_mut().enumerate().take(deg_omega + 1) {
        let tmp = (0..=i)
            .filter(|&j| syndromes[i - j] != A0 && lambda[j] != A0)
            .fold(0u8, |acc, j| {
                acc ^ alpha(syndromes[i - j] as usize + lambda[j] as usize)
            });
        *o = INDEX_OF[tmp as usize];
    }

    // Forney: error value = omega(X^-1) * X^-(FCR-1) / lambda'(X^-1)
    let mut magnitudes = [0u8; PARITY_LEN];
    for (&root, magnitude) in roots.iter().zip(magnitudes.iter_mut()) {
        let num1 = (0..=deg_omega)
            .filter(|&i| omega[i] != A0)
            .fold(0u8, |acc, i| acc ^ alpha(omega[i] as usize + i * root));
        let num2 = alpha(root * (FCR - 1) + NN);
        // Odd terms of lambda make up its formal derivative
        let den = (0..=deg_lambda.min(PARITY_LEN - 1) & !1)
            .step_by(2)
            .filter(|&i| lambda[i + 1] != A0)
            .fold(0u8, |acc, i| acc ^ alpha(lambda[i + 1] as usize + i * root));
        if den == 0 {
            return Err(FecError::UncorrectableBlock);
        }
        if num1 != 0 {
            *magnitude = alpha(index(num1) + index(num2) + NN - index(den));
        }
    }

    for (&loc, &magnitude) in locations.iter().zip(magnitudes.iter()) {
        block[loc - pad] ^= magnitude;
    }

    Ok(count)
}

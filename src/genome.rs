use serde::{Deserialize, Serialize};

use crate::config::GeneticsConfig;
use crate::random::SimContext;

/// Weight of the dominant allele in the expressed phenotype.
pub const DOMINANT_WEIGHT: f32 = 0.75;

/// Predator phenotypes above this value make a hunter.
pub const PREDATOR_THRESHOLD: f32 = 0.5;

/// Where an offending prey allele is pulled down to.
const PREY_CEILING: f32 = 0.49;

/// Heritable traits of a fish.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trait {
    Speed,
    Size,
    Vision,
    Metabolism,
    Digestion,
    Reproduction,
    Defense,
    Color,
    PreferredDepth,
    Predator,
    ReproductionStrategy,
}

pub const TRAIT_COUNT: usize = 11;

impl Trait {
    pub const ALL: [Trait; TRAIT_COUNT] = [
        Trait::Speed,
        Trait::Size,
        Trait::Vision,
        Trait::Metabolism,
        Trait::Digestion,
        Trait::Reproduction,
        Trait::Defense,
        Trait::Color,
        Trait::PreferredDepth,
        Trait::Predator,
        Trait::ReproductionStrategy,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Trait::Speed => "speed",
            Trait::Size => "size",
            Trait::Vision => "vision",
            Trait::Metabolism => "metabolism",
            Trait::Digestion => "digestion",
            Trait::Reproduction => "reproduction",
            Trait::Defense => "defense",
            Trait::Color => "color",
            Trait::PreferredDepth => "preferred_depth",
            Trait::Predator => "predator",
            Trait::ReproductionStrategy => "reproduction_strategy",
        }
    }
}

/// One diploid locus: two alleles in [0, 1] and the index of the dominant one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    pub alleles: [f32; 2],
    pub dominance: u8,
}

impl Gene {
    pub fn new(first: f32, second: f32, dominance: u8) -> Self {
        Self {
            alleles: [first.clamp(0.0, 1.0), second.clamp(0.0, 1.0)],
            dominance: dominance.min(1),
        }
    }

    pub fn dominant(&self) -> f32 {
        self.alleles[(self.dominance & 1) as usize]
    }

    pub fn recessive(&self) -> f32 {
        self.alleles[1 - (self.dominance & 1) as usize]
    }

    /// Incomplete dominance: the dominant allele carries three quarters of the weight.
    pub fn phenotype(&self) -> f32 {
        self.dominant() * DOMINANT_WEIGHT + self.recessive() * (1.0 - DOMINANT_WEIGHT)
    }
}

/// Full diploid genome of a fish.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawGenome")]
pub struct Genome {
    genes: [Gene; TRAIT_COUNT],
}

/// Wire form of a genome. Decoding always goes through `Genome::from_genes`.
#[derive(Deserialize)]
struct RawGenome {
    genes: [Gene; TRAIT_COUNT],
}

impl From<RawGenome> for Genome {
    fn from(raw: RawGenome) -> Self {
        Genome::from_genes(raw.genes)
    }
}

impl Genome {
    /// Fresh founder genome. Predator alleles are drawn low so most founders are prey.
    pub fn random(ctx: &mut SimContext) -> Self {
        let mut genes = [Gene::new(0.0, 0.0, 0); TRAIT_COUNT];
        for t in Trait::ALL {
            let (hi_a, hi_b) = if t == Trait::Predator { (0.75, 0.85) } else { (1.0, 1.0) };
            genes[t.index()] = Gene::new(
                ctx.uniform(0.0, hi_a),
                ctx.uniform(0.0, hi_b),
                ctx.coin() as u8,
            );
        }
        Self::from_genes(genes)
    }

    /// Build from explicit genes (user-authored or deserialized), clamping alleles
    /// and reconciling the predator locus.
    pub fn from_genes(genes: [Gene; TRAIT_COUNT]) -> Self {
        let mut genome = Self {
            genes: genes.map(|g| Gene::new(g.alleles[0], g.alleles[1], g.dominance)),
        };
        genome.normalize_predator();
        genome
    }

    pub fn gene(&self, t: Trait) -> &Gene {
        &self.genes[t.index()]
    }

    pub fn genes(&self) -> &[Gene; TRAIT_COUNT] {
        &self.genes
    }

    pub fn phenotype(&self, t: Trait) -> f32 {
        self.genes[t.index()].phenotype()
    }

    pub fn is_predator(&self) -> bool {
        self.phenotype(Trait::Predator) > PREDATOR_THRESHOLD
    }

    /// Nudge the predator alleles so the genotype agrees with the expressed class:
    /// hunters carry no allele below the threshold, prey none above it.
    pub fn normalize_predator(&mut self) {
        let predator = self.is_predator();
        let gene = &mut self.genes[Trait::Predator.index()];
        let [a, b] = gene.alleles;
        if predator {
            if a > b && b < PREDATOR_THRESHOLD {
                gene.alleles[1] = PREDATOR_THRESHOLD;
            } else if b > a && a < PREDATOR_THRESHOLD {
                gene.alleles[0] = PREDATOR_THRESHOLD;
            }
        } else if a > b && a > PREDATOR_THRESHOLD {
            gene.alleles[0] = PREY_CEILING;
        } else if b > a && b > PREDATOR_THRESHOLD {
            gene.alleles[1] = PREY_CEILING;
        }
    }

    /// Sexual recombination with mutation.
    ///
    /// Each parent passes its dominant allele with probability
    /// `dominant_inheritance`, otherwise one of its two alleles at random. Every
    /// inherited allele may then mutate; the predator locus mutates on a much
    /// narrower range so lineages keep their class.
    pub fn recombine(
        mother: &Genome,
        father: &Genome,
        settings: &GeneticsConfig,
        ctx: &mut SimContext,
    ) -> Genome {
        let mut genes = [Gene::new(0.0, 0.0, 0); TRAIT_COUNT];
        for t in Trait::ALL {
            let range = if t == Trait::Predator {
                settings.predator_mutation_range
            } else {
                settings.mutation_range
            };
            let from_mother = inherit(mother.gene(t), settings, ctx);
            let from_father = inherit(father.gene(t), settings, ctx);
            genes[t.index()] = Gene::new(
                mutate(from_mother, range, settings, ctx),
                mutate(from_father, range, settings, ctx),
                ctx.coin() as u8,
            );
        }
        Self::from_genes(genes)
    }
}

fn inherit(gene: &Gene, settings: &GeneticsConfig, ctx: &mut SimContext) -> f32 {
    if ctx.chance(settings.dominant_inheritance) {
        gene.dominant()
    } else {
        gene.alleles[ctx.pick_index(2)]
    }
}

fn mutate(allele: f32, range: f32, settings: &GeneticsConfig, ctx: &mut SimContext) -> f32 {
    if ctx.chance(settings.mutation_rate) {
        (allele + ctx.jitter(range)).clamp(0.0, 1.0)
    } else {
        allele
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_genes(value: f32) -> [Gene; TRAIT_COUNT] {
        [Gene::new(value, value, 0); TRAIT_COUNT]
    }

    #[test]
    fn phenotype_weights_dominant_allele() {
        let gene = Gene::new(0.2, 1.0, 1);
        assert!((gene.phenotype() - (1.0 * 0.75 + 0.2 * 0.25)).abs() < 1e-6);
        let flipped = Gene::new(0.2, 1.0, 0);
        assert!((flipped.phenotype() - (0.2 * 0.75 + 1.0 * 0.25)).abs() < 1e-6);
    }

    #[test]
    fn alleles_stay_clamped_under_heavy_mutation() {
        let settings = GeneticsConfig {
            mutation_rate: 1.0,
            mutation_range: 0.9,
            predator_mutation_range: 0.9,
            dominant_inheritance: 0.7,
        };
        let mut ctx = SimContext::new(5, 128);
        let low = Genome::from_genes(uniform_genes(0.0));
        let high = Genome::from_genes(uniform_genes(1.0));
        for _ in 0..500 {
            let child = Genome::recombine(&low, &high, &settings, &mut ctx);
            for gene in child.genes() {
                assert!(gene.alleles.iter().all(|a| (0.0..=1.0).contains(a)));
            }
        }
    }

    #[test]
    fn predator_class_agrees_with_dominant_allele() {
        let settings = GeneticsConfig::default();
        let mut ctx = SimContext::new(17, 256);
        let mut parents: Vec<Genome> = (0..50).map(|_| Genome::random(&mut ctx)).collect();
        for i in 0..200 {
            let child = Genome::recombine(&parents[i % 50], &parents[(i * 7 + 3) % 50], &settings, &mut ctx);
            parents.push(child);
        }
        for genome in &parents {
            let gene = genome.gene(Trait::Predator);
            if genome.is_predator() {
                assert!(gene.dominant() >= PREDATOR_THRESHOLD, "{gene:?}");
                assert!(gene.alleles.iter().all(|a| *a >= PREDATOR_THRESHOLD));
            } else {
                assert!(gene.dominant() <= PREDATOR_THRESHOLD, "{gene:?}");
                assert!(gene.alleles.iter().all(|a| *a <= PREDATOR_THRESHOLD));
            }
        }
    }

    #[test]
    fn predator_nudge_keeps_class() {
        // Hunter whose recessive allele is low.
        let mut genes = uniform_genes(0.5);
        genes[Trait::Predator.index()] = Gene::new(0.9, 0.2, 0);
        let hunter = Genome::from_genes(genes);
        assert!(hunter.is_predator());
        assert_eq!(hunter.gene(Trait::Predator).alleles, [0.9, 0.5]);

        // Prey carrying a high recessive allele.
        genes[Trait::Predator.index()] = Gene::new(0.1, 0.9, 0);
        let prey = Genome::from_genes(genes);
        assert!(!prey.is_predator());
        assert_eq!(prey.gene(Trait::Predator).alleles, [0.1, 0.49]);
    }

    #[test]
    fn predator_locus_barely_mutates() {
        let settings = GeneticsConfig {
            mutation_rate: 1.0,
            ..GeneticsConfig::default()
        };
        let mut ctx = SimContext::new(23, 64);
        let mut genes = uniform_genes(0.3);
        genes[Trait::Predator.index()] = Gene::new(0.2, 0.2, 0);
        let parent = Genome::from_genes(genes);
        for _ in 0..100 {
            let child = Genome::recombine(&parent, &parent, &settings, &mut ctx);
            let gene = child.gene(Trait::Predator);
            assert!(gene.alleles.iter().all(|a| (a - 0.2).abs() <= 0.005 + 1e-6));
        }
    }

    #[test]
    fn genome_round_trips_through_json() {
        let mut ctx = SimContext::new(2, 32);
        let genome = Genome::random(&mut ctx);
        let json = serde_json::to_string(&genome).unwrap();
        let back: Genome = serde_json::from_str(&json).unwrap();
        assert_eq!(genome, back);
    }

    #[test]
    fn decoded_genomes_are_clamped_and_consistent() {
        let gene = r#"{"alleles":[1.7,-0.4],"dominance":9}"#;
        let json = format!(r#"{{"genes":[{}]}}"#, vec![gene; TRAIT_COUNT].join(","));
        let genome: Genome = serde_json::from_str(&json).expect("valid genome json");

        for gene in genome.genes() {
            assert!(gene.alleles.iter().all(|a| (0.0..=1.0).contains(a)), "{:?}", gene.alleles);
            assert!(gene.dominance <= 1);
        }
        let predator = genome.gene(Trait::Predator);
        if genome.is_predator() {
            assert!(predator.alleles.iter().all(|&a| a >= PREDATOR_THRESHOLD));
        } else {
            assert!(predator.alleles.iter().all(|&a| a <= PREDATOR_THRESHOLD));
        }
        assert_eq!(Genome::from_genes(*genome.genes()), genome);
    }
}

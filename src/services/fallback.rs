// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Built-in demo data, shown when the API cannot be reached.

use crate::models::{Establishment, EstablishmentId};
use crate::random;

/// Stock cover photos used when an establishment has no image of its own.
pub const STOCK_IMAGES: [&str; 8] = [
    "https://images.unsplash.com/photo-1555396273-367ea4eb4db5?w=400&h=300&fit=crop",
    "https://images.unsplash.com/photo-1414235077428-338989a2e8c0?w=400&h=300&fit=crop",
    "https://images.unsplash.com/photo-1517248135467-4c7edcad34c4?w=400&h=300&fit=crop",
    "https://images.unsplash.com/photo-1559925393-8be0ec4767c8?w=400&h=300&fit=crop",
    "https://images.unsplash.com/photo-1578474846511-04ba529f0b88?w=400&h=300&fit=crop",
    "https://images.unsplash.com/photo-1565299624946-b28f40a0ae38?w=400&h=300&fit=crop",
    "https://images.unsplash.com/photo-1568901346375-23c9450c58cd?w=400&h=300&fit=crop",
    "https://images.unsplash.com/photo-1567620905732-2d1ec7ab7445?w=400&h=300&fit=crop",
];

/// Pick a stock photo at random.
pub fn random_stock_image() -> String {
    STOCK_IMAGES[random::index(STOCK_IMAGES.len())].to_string()
}

// (name, type, description, address, rating)
const DEMO: [(&str, &str, &str, &str, f64); 8] = [
    (
        "Le Gourmet Parisien",
        "Restaurant",
        "Cuisine française raffinée dans un cadre élégant. Spécialités de poisson et de viande avec des produits locaux.",
        "15 Rue de la Paix, 75002 Paris",
        4.5,
    ),
    (
        "Pasta e Vino",
        "Restaurant Italien",
        "Authentique cuisine italienne avec pâtes fraîches faites maison. Vaste sélection de vins italiens.",
        "22 Rue des Lombards, 75004 Paris",
        4.2,
    ),
    (
        "Sushi Zen",
        "Restaurant Japonais",
        "Sushi et sashimi préparés par un chef japonais expérimenté. Ambiance zen et apaisante.",
        "8 Rue Sainte-Anne, 75001 Paris",
        4.7,
    ),
    (
        "Le Bistrot Moderne",
        "Bistrot",
        "Bistrot traditionnel avec une touche moderne. Plats généreux et ambiance chaleureuse.",
        "45 Rue du Faubourg Saint-Honoré, 75008 Paris",
        4.0,
    ),
    (
        "Coffee & Co",
        "Café",
        "Café artisanal et pâtisseries maison. Lieu idéal pour travailler ou se détendre.",
        "12 Boulevard Saint-Germain, 75005 Paris",
        4.3,
    ),
    (
        "Burger Factory",
        "Fast-Food",
        "Burgers gourmets avec ingrédients de qualité. Options végétariennes disponibles.",
        "30 Rue de Rivoli, 75004 Paris",
        4.1,
    ),
    (
        "La Table du Marché",
        "Restaurant",
        "Cuisine du marché avec produits frais et de saison. Menu changeant quotidiennement.",
        "18 Rue Montorgueil, 75001 Paris",
        4.4,
    ),
    (
        "Le Petit Bouchon",
        "Bistrot",
        "Cuisine lyonnaise traditionnelle dans une ambiance conviviale. Spécialités de charcuterie.",
        "5 Rue des Rosiers, 75004 Paris",
        4.6,
    ),
];

/// The demo dataset, each record with a stock cover assigned.
///
/// Ids are client-generated (`demo-1` ..) so they can never be sent to the API.
pub fn demo_establishments() -> Vec<Establishment> {
    DEMO.iter()
        .enumerate()
        .map(
            |(i, (name, kind, description, address, rating))| Establishment {
                id: EstablishmentId::Generated(format!("demo-{}", i + 1)),
                name: name.to_string(),
                kind: kind.to_string(),
                address: address.to_string(),
                phone_number: None,
                email: None,
                website: None,
                description: description.to_string(),
                rating: *rating,
                cover_image: Some(STOCK_IMAGES[i % STOCK_IMAGES.len()].to_string()),
            },
        )
        .collect()
}
